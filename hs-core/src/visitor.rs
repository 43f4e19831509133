//! Traversal over hardware, sensors and parameters
//!
//! `accept` visits an element itself; `traverse` visits its children. Visiting a
//! sensor does not reach its parameters unless the visitor calls `traverse`.

use serde::Serialize;

use crate::hw::Hardware;
use crate::identifier::Identifier;
use crate::sensor::{Parameter, Sensor, SensorType, SensorValue};

/// Callback set for a traversal
pub trait Visitor {
    fn visit_hardware(&mut self, _hardware: &dyn Hardware) {}

    fn visit_sensor(&mut self, sensor: &Sensor);

    fn visit_parameter(&mut self, _parameter: &Parameter) {}
}

/// Anything a [`Visitor`] can be dispatched to
pub trait Element {
    /// Dispatch to the visitor method for this element
    fn accept(&self, visitor: &mut dyn Visitor);

    /// Accept the visitor on each direct child
    fn traverse(&self, visitor: &mut dyn Visitor);
}

// ============================================================================
// Reading collector
// ============================================================================

/// Serializable snapshot of one sensor
#[derive(Debug, Clone, Serialize)]
pub struct SensorReading {
    pub identifier: Identifier,
    pub hardware: Identifier,
    pub name: String,
    pub sensor_type: SensorType,
    pub index: usize,
    pub value: Option<f32>,
    pub min: Option<f32>,
    pub max: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<SensorValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterReading>,
}

/// Serializable snapshot of one parameter
#[derive(Debug, Clone, Serialize)]
pub struct ParameterReading {
    pub identifier: Identifier,
    pub name: String,
    pub value: f32,
    pub is_default: bool,
}

/// Collects [`SensorReading`]s from every sensor it visits
#[derive(Debug, Default)]
pub struct ReadingCollector {
    include_history: bool,
    readings: Vec<SensorReading>,
}

impl ReadingCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also copy each sensor's stored history
    pub fn with_history(mut self) -> Self {
        self.include_history = true;
        self
    }

    pub fn readings(&self) -> &[SensorReading] {
        &self.readings
    }

    pub fn into_readings(self) -> Vec<SensorReading> {
        self.readings
    }
}

impl Visitor for ReadingCollector {
    fn visit_hardware(&mut self, hardware: &dyn Hardware) {
        hardware.traverse(self);
    }

    fn visit_sensor(&mut self, sensor: &Sensor) {
        self.readings.push(SensorReading {
            identifier: sensor.identifier().clone(),
            hardware: sensor.hardware().clone(),
            name: sensor.name(),
            sensor_type: sensor.sensor_type(),
            index: sensor.index(),
            value: sensor.value(),
            min: sensor.min(),
            max: sensor.max(),
            history: if self.include_history { sensor.values() } else { Vec::new() },
            parameters: Vec::new(),
        });
        sensor.traverse(self);
    }

    fn visit_parameter(&mut self, parameter: &Parameter) {
        if let Some(reading) = self.readings.last_mut() {
            reading.parameters.push(ParameterReading {
                identifier: parameter.identifier().clone(),
                name: parameter.name().to_string(),
                value: parameter.value(),
                is_default: parameter.is_default(),
            });
        }
    }
}

// ============================================================================
// Min/max reset
// ============================================================================

/// Clears min and max on every sensor it visits
#[derive(Debug, Default)]
pub struct MinMaxReset {
    reset: usize,
}

impl MinMaxReset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sensors reset so far
    pub fn count(&self) -> usize {
        self.reset
    }
}

impl Visitor for MinMaxReset {
    fn visit_hardware(&mut self, hardware: &dyn Hardware) {
        hardware.traverse(self);
    }

    fn visit_sensor(&mut self, sensor: &Sensor) {
        sensor.reset_min();
        sensor.reset_max();
        self.reset += 1;
    }
}
