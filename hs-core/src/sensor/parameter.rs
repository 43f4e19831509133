//! Sensor parameters
//!
//! Named numeric settings attached to a sensor (calibration offsets, scale
//! factors). Each one has a compiled-in default and an optional user override
//! persisted through [`Settings`].

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::Result;
use crate::identifier::Identifier;
use crate::settings::Settings;
use crate::visitor::{Element, Visitor};

/// Static description of a parameter, supplied by the hardware controller
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescription {
    pub name: String,
    pub description: String,
    pub default_value: f32,
}

impl ParameterDescription {
    pub fn new(name: impl Into<String>, description: impl Into<String>, default_value: f32) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            default_value,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ParameterState {
    value: f32,
    is_default: bool,
}

/// A parameter owned by one sensor
pub struct Parameter {
    description: ParameterDescription,
    identifier: Identifier,
    settings: Arc<dyn Settings>,
    state: RwLock<ParameterState>,
}

impl Parameter {
    /// Create the parameter at `index` of the sensor identified by `sensor`.
    ///
    /// A persisted override that does not parse as a number is ignored.
    pub(crate) fn new(
        description: ParameterDescription,
        sensor: &Identifier,
        index: usize,
        settings: Arc<dyn Settings>,
    ) -> Result<Self> {
        let identifier = sensor.join(["parameter".to_string(), index.to_string()])?;

        let key = identifier.to_string();
        let state = if settings.contains(&key) {
            let raw = settings.get(&key, "");
            match raw.trim().parse::<f32>() {
                Ok(value) => ParameterState { value, is_default: false },
                Err(_) => {
                    debug!("Ignoring unparseable override {:?} for {}", raw, key);
                    ParameterState { value: description.default_value, is_default: true }
                }
            }
        } else {
            ParameterState { value: description.default_value, is_default: true }
        };

        Ok(Self {
            description,
            identifier,
            settings,
            state: RwLock::new(state),
        })
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn name(&self) -> &str {
        &self.description.name
    }

    pub fn description(&self) -> &str {
        &self.description.description
    }

    pub fn default_value(&self) -> f32 {
        self.description.default_value
    }

    /// Effective value: the override if one is set, else the default
    pub fn value(&self) -> f32 {
        self.state.read().value
    }

    pub fn is_default(&self) -> bool {
        self.state.read().is_default
    }

    /// Set and persist an override
    pub fn set_value(&self, value: f32) {
        let mut state = self.state.write();
        state.value = value;
        state.is_default = false;
        self.settings.set(self.identifier.as_str(), &value.to_string());
    }

    /// Revert to the default (`true`) or pin the current value as an override (`false`)
    pub fn set_default(&self, is_default: bool) {
        let mut state = self.state.write();
        state.is_default = is_default;
        if is_default {
            state.value = self.description.default_value;
            self.settings.remove(self.identifier.as_str());
        } else {
            self.settings.set(self.identifier.as_str(), &state.value.to_string());
        }
    }
}

impl std::fmt::Debug for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = *self.state.read();
        f.debug_struct("Parameter")
            .field("identifier", &self.identifier)
            .field("name", &self.description.name)
            .field("value", &state.value)
            .field("is_default", &state.is_default)
            .finish()
    }
}

impl Element for Parameter {
    fn accept(&self, visitor: &mut dyn Visitor) {
        visitor.visit_parameter(self);
    }

    fn traverse(&self, _visitor: &mut dyn Visitor) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MemorySettings;

    fn sensor_id() -> Identifier {
        Identifier::new(["amdcpu", "0", "temperature", "0"]).unwrap()
    }

    fn offset() -> ParameterDescription {
        ParameterDescription::new("Offset", "Temperature offset in °C", 0.0)
    }

    #[test]
    fn test_defaults_without_override() {
        let settings = Arc::new(MemorySettings::new());
        let param = Parameter::new(offset(), &sensor_id(), 0, settings).unwrap();

        assert_eq!(param.identifier().as_str(), "/amdcpu/0/temperature/0/parameter/0");
        assert_eq!(param.value(), 0.0);
        assert!(param.is_default());
        assert_eq!(param.name(), "Offset");
    }

    #[test]
    fn test_set_value_persists() {
        let settings = Arc::new(MemorySettings::new());
        let param = Parameter::new(offset(), &sensor_id(), 0, settings.clone()).unwrap();

        param.set_value(-2.5);
        assert_eq!(param.value(), -2.5);
        assert!(!param.is_default());
        assert_eq!(settings.get("/amdcpu/0/temperature/0/parameter/0", ""), "-2.5");

        let reloaded = Parameter::new(offset(), &sensor_id(), 0, settings).unwrap();
        assert_eq!(reloaded.value(), -2.5);
        assert!(!reloaded.is_default());
    }

    #[test]
    fn test_set_default_removes_override() {
        let settings = Arc::new(MemorySettings::new());
        let param = Parameter::new(offset(), &sensor_id(), 0, settings.clone()).unwrap();

        param.set_value(4.0);
        param.set_default(true);
        assert_eq!(param.value(), 0.0);
        assert!(param.is_default());
        assert!(!settings.contains("/amdcpu/0/temperature/0/parameter/0"));
    }

    #[test]
    fn test_unparseable_override_is_ignored() {
        let settings = Arc::new(MemorySettings::new());
        settings.set("/amdcpu/0/temperature/0/parameter/0", "warm");

        let param = Parameter::new(offset(), &sensor_id(), 0, settings).unwrap();
        assert_eq!(param.value(), 0.0);
        assert!(param.is_default());
    }
}
