//! Active sensor set with change notifications
//!
//! A controller owns all of its sensors but only exposes the ones it currently
//! considers valid. Adding an already-active sensor or removing an inactive one
//! is a no-op and raises no event.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::sensor::Sensor;

/// Change in a controller's active set
#[derive(Debug, Clone)]
pub enum SensorEvent {
    Added(Arc<Sensor>),
    Removed(Arc<Sensor>),
}

impl SensorEvent {
    pub fn sensor(&self) -> &Arc<Sensor> {
        match self {
            SensorEvent::Added(sensor) | SensorEvent::Removed(sensor) => sensor,
        }
    }
}

/// Callback invoked synchronously for each [`SensorEvent`]
pub type SensorObserver = Box<dyn Fn(&SensorEvent) + Send + Sync>;

/// Ordered set of active sensors plus its observers.
///
/// Observers run in registration order on the caller's thread, after the set
/// lock is released, so they may query the set themselves.
#[derive(Default)]
pub struct ActiveSensors {
    sensors: RwLock<Vec<Arc<Sensor>>>,
    observers: RwLock<Vec<SensorObserver>>,
}

impl ActiveSensors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer for future events.
    ///
    /// Observers must not subscribe further observers from inside a callback.
    pub fn subscribe(&self, observer: SensorObserver) {
        self.observers.write().push(observer);
    }

    /// Add `sensor` if absent. Returns whether the set changed.
    pub fn activate(&self, sensor: &Arc<Sensor>) -> bool {
        {
            let mut sensors = self.sensors.write();
            if sensors.iter().any(|s| Arc::ptr_eq(s, sensor)) {
                return false;
            }
            sensors.push(sensor.clone());
        }
        self.notify(&SensorEvent::Added(sensor.clone()));
        true
    }

    /// Remove `sensor` if present. Returns whether the set changed.
    pub fn deactivate(&self, sensor: &Arc<Sensor>) -> bool {
        {
            let mut sensors = self.sensors.write();
            let Some(pos) = sensors.iter().position(|s| Arc::ptr_eq(s, sensor)) else {
                return false;
            };
            sensors.remove(pos);
        }
        self.notify(&SensorEvent::Removed(sensor.clone()));
        true
    }

    pub fn contains(&self, sensor: &Arc<Sensor>) -> bool {
        self.sensors.read().iter().any(|s| Arc::ptr_eq(s, sensor))
    }

    /// Copy of the active sensors in activation order
    pub fn snapshot(&self) -> Vec<Arc<Sensor>> {
        self.sensors.read().clone()
    }

    pub fn len(&self) -> usize {
        self.sensors.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.read().is_empty()
    }

    fn notify(&self, event: &SensorEvent) {
        for observer in self.observers.read().iter() {
            observer(event);
        }
    }
}

impl std::fmt::Debug for ActiveSensors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveSensors")
            .field("sensors", &self.sensors.read().len())
            .field("observers", &self.observers.read().len())
            .finish()
    }
}
