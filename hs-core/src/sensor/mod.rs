//! Sensor model
//!
//! A [`Sensor`] is one named, typed, indexed measurement channel of a hardware
//! device. It owns its current reading, running extremes, a bounded history and
//! a fixed set of [`Parameter`]s.
//!
//! Sensors are created once by their hardware controller and shared as
//! `Arc<Sensor>`. Live state sits behind a lock, so a consumer can read values
//! and history while the controller is in the middle of an update. Writers must
//! still be serialized per controller.

pub mod history;
pub mod parameter;

use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::trace;

use crate::error::Result;
use crate::identifier::Identifier;
use crate::settings::Settings;
use crate::visitor::{Element, Visitor};

pub use history::{SensorHistory, SensorValue};
pub use parameter::{Parameter, ParameterDescription};

/// Category of a sensor; its lowercase name is part of the sensor identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorType {
    Voltage,
    Clock,
    Temperature,
    Load,
    Fan,
    Flow,
    Control,
    Level,
}

impl SensorType {
    /// Lowercase name used in identifiers
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorType::Voltage => "voltage",
            SensorType::Clock => "clock",
            SensorType::Temperature => "temperature",
            SensorType::Load => "load",
            SensorType::Fan => "fan",
            SensorType::Flow => "flow",
            SensorType::Control => "control",
            SensorType::Level => "level",
        }
    }

    /// Unit suffix for display
    pub fn unit(&self) -> &'static str {
        match self {
            SensorType::Voltage => "V",
            SensorType::Clock => "MHz",
            SensorType::Temperature => "°C",
            SensorType::Load | SensorType::Control | SensorType::Level => "%",
            SensorType::Fan => "RPM",
            SensorType::Flow => "L/h",
        }
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable part of a sensor, guarded as one unit
#[derive(Debug)]
struct SensorState {
    name: String,
    value: Option<f32>,
    min: Option<f32>,
    max: Option<f32>,
    history: SensorHistory,
}

/// A named, typed, indexed measurement channel
pub struct Sensor {
    index: usize,
    sensor_type: SensorType,
    default_name: String,
    default_hidden: bool,
    hardware: Identifier,
    identifier: Identifier,
    parameters: Vec<Parameter>,
    settings: Arc<dyn Settings>,
    state: RwLock<SensorState>,
}

impl Sensor {
    /// Create a sensor with no parameters that is visible by default.
    ///
    /// `hardware` is the identifier of the owning device; the sensor never owns
    /// or outlives that device.
    pub fn new(
        name: impl Into<String>,
        index: usize,
        sensor_type: SensorType,
        hardware: &Identifier,
        settings: Arc<dyn Settings>,
    ) -> Result<Self> {
        SensorBuilder::new(name, index, sensor_type).build(hardware, settings)
    }

    /// Start building a sensor with optional parameters or default-hidden flag
    pub fn builder(name: impl Into<String>, index: usize, sensor_type: SensorType) -> SensorBuilder {
        SensorBuilder::new(name, index, sensor_type)
    }

    // ========================================================================
    // Identity
    // ========================================================================

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn sensor_type(&self) -> SensorType {
        self.sensor_type
    }

    /// Identifier of the owning hardware
    pub fn hardware(&self) -> &Identifier {
        &self.hardware
    }

    /// `<hardware>/<type>/<index>`, fixed at construction
    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn is_default_hidden(&self) -> bool {
        self.default_hidden
    }

    // ========================================================================
    // Display name
    // ========================================================================

    pub fn name(&self) -> String {
        self.state.read().name.clone()
    }

    pub fn default_name(&self) -> &str {
        &self.default_name
    }

    /// Rename the sensor. An empty name reverts to the default name.
    ///
    /// The resolved name is persisted under `<identifier>/name` either way.
    pub fn set_name(&self, name: &str) {
        let resolved = if name.is_empty() {
            self.default_name.clone()
        } else {
            name.to_string()
        };
        self.settings.set(&name_key(&self.identifier), &resolved);
        self.state.write().name = resolved;
    }

    // ========================================================================
    // Readings
    // ========================================================================

    pub fn value(&self) -> Option<f32> {
        self.state.read().value
    }

    pub fn min(&self) -> Option<f32> {
        self.state.read().min
    }

    pub fn max(&self) -> Option<f32> {
        self.state.read().max
    }

    /// Assign the current reading, stamped with the wall clock
    pub fn set_value(&self, value: Option<f32>) {
        self.set_value_at(value, SystemTime::now());
    }

    /// Assign the current reading as of `now`.
    ///
    /// Trims expired history, folds a present value into the downsampling
    /// accumulator, stores the value and widens min/max. `None` means "no
    /// reading right now": it does not touch the accumulator or the extremes.
    pub fn set_value_at(&self, value: Option<f32>, now: SystemTime) {
        let mut state = self.state.write();
        if let Some(point) = state.history.record(value, now) {
            trace!("{}: history point {:.3}", self.identifier, point.value);
        }

        state.value = value;
        if let Some(v) = value {
            if state.min.map_or(true, |min| v < min) {
                state.min = Some(v);
            }
            if state.max.map_or(true, |max| v > max) {
                state.max = Some(v);
            }
        }
    }

    pub fn reset_min(&self) {
        self.state.write().min = None;
    }

    pub fn reset_max(&self) {
        self.state.write().max = None;
    }

    /// Snapshot of the stored history, oldest first
    pub fn values(&self) -> Vec<SensorValue> {
        self.state.read().history.to_vec()
    }

    /// Run `f` against the history without copying it
    pub fn with_history<R>(&self, f: impl FnOnce(&SensorHistory) -> R) -> R {
        f(&self.state.read().history)
    }

    /// Drop readings waiting to be averaged into the next history point
    pub(crate) fn discard_pending(&self) {
        self.state.write().history.discard_pending();
    }

    // ========================================================================
    // Parameters
    // ========================================================================

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }
}

fn name_key(identifier: &Identifier) -> String {
    format!("{}/name", identifier)
}

impl fmt::Debug for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("Sensor")
            .field("identifier", &self.identifier)
            .field("name", &state.name)
            .field("value", &state.value)
            .field("min", &state.min)
            .field("max", &state.max)
            .field("history_len", &state.history.len())
            .finish()
    }
}

impl Element for Sensor {
    /// Visits the sensor only; parameters are reached through `traverse`
    fn accept(&self, visitor: &mut dyn Visitor) {
        visitor.visit_sensor(self);
    }

    fn traverse(&self, visitor: &mut dyn Visitor) {
        for parameter in &self.parameters {
            parameter.accept(visitor);
        }
    }
}

/// Builder for sensors that need parameters or start hidden
#[derive(Debug, Clone)]
pub struct SensorBuilder {
    name: String,
    index: usize,
    sensor_type: SensorType,
    default_hidden: bool,
    parameters: Vec<ParameterDescription>,
}

impl SensorBuilder {
    fn new(name: impl Into<String>, index: usize, sensor_type: SensorType) -> Self {
        Self {
            name: name.into(),
            index,
            sensor_type,
            default_hidden: false,
            parameters: Vec::new(),
        }
    }

    pub fn default_hidden(mut self, hidden: bool) -> Self {
        self.default_hidden = hidden;
        self
    }

    pub fn parameter(mut self, description: ParameterDescription) -> Self {
        self.parameters.push(description);
        self
    }

    /// Create the sensor, restoring a persisted display name if one exists
    pub fn build(self, hardware: &Identifier, settings: Arc<dyn Settings>) -> Result<Sensor> {
        let identifier = hardware.join([self.sensor_type.as_str().to_string(), self.index.to_string()])?;

        let parameters = self
            .parameters
            .into_iter()
            .enumerate()
            .map(|(i, description)| Parameter::new(description, &identifier, i, settings.clone()))
            .collect::<Result<Vec<_>>>()?;

        let name = settings.get(&name_key(&identifier), &self.name);

        Ok(Sensor {
            index: self.index,
            sensor_type: self.sensor_type,
            default_name: self.name,
            default_hidden: self.default_hidden,
            hardware: hardware.clone(),
            identifier,
            parameters,
            settings,
            state: RwLock::new(SensorState {
                name,
                value: None,
                min: None,
                max: None,
                history: SensorHistory::new(),
            }),
        })
    }
}
