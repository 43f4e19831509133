/*
 * This file is part of Hypersense.
 *
 * Copyright (C) 2025 Hypersense contributors
 *
 * Hypersense is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Hypersense is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Hypersense. If not, see <https://www.gnu.org/licenses/>.
 */

//! Sensor activation logging

use hs_core::{Hardware, SensorEvent};
use tracing::info;

/// Render one activation change as a log line
pub fn describe(hardware: &str, event: &SensorEvent) -> String {
    let sensor = event.sensor();
    let verb = match event {
        SensorEvent::Added(_) => "added",
        SensorEvent::Removed(_) => "removed",
    };
    format!(
        "{}: sensor {} '{}' ({}, {})",
        hardware,
        verb,
        sensor.name(),
        sensor.identifier(),
        sensor.sensor_type()
    )
}

/// Log every future sensor activation and deactivation of `hardware` at `info`
pub fn log_sensor_events(hardware: &dyn Hardware) {
    let name = hardware.name().to_string();
    hardware.subscribe(Box::new(move |event| {
        info!("{}", describe(&name, event));
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use hs_core::{Identifier, MemorySettings, Sensor, SensorType};
    use std::sync::Arc;

    #[test]
    fn test_describe() {
        let hw = Identifier::new(["amdcpu", "0"]).unwrap();
        let sensor = Arc::new(
            Sensor::new("Core", 0, SensorType::Temperature, &hw, Arc::new(MemorySettings::new())).unwrap(),
        );

        assert_eq!(
            describe("Phenom", &SensorEvent::Added(sensor.clone())),
            "Phenom: sensor added 'Core' (/amdcpu/0/temperature/0, temperature)"
        );
        assert!(describe("Phenom", &SensorEvent::Removed(sensor)).contains("sensor removed"));
    }
}
