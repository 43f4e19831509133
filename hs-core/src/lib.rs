//! Hypersense Core Library
//!
//! Hardware sensor model and controllers for Linux systems.
//!
//! # Features
//!
//! - **Sensors**: Typed readings with min/max tracking and a downsampled two hour history
//! - **Parameters**: Per-sensor tunables persisted through a [`Settings`] store
//! - **Hardware**: Controllers that own sensors and publish activation changes
//! - **AMD family 10h**: Package temperature over PCI config space plus per-core load
//!
//! # Module Structure
//!
//! - `sensor/` - Sensor, parameter and history types
//! - `hw/` - Hardware trait, PCI and load access, CPU controllers
//! - `visitor` - Traversal over hardware, sensors and parameters
//! - `settings` - Key/value persistence
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use hs_core::{Amd10Cpu, CpuDescriptor, Hardware, JsonSettings, ProcStatLoad, SysfsPciBus};
//!
//! let cpu = CpuDescriptor::read_local().unwrap();
//! let settings = Arc::new(JsonSettings::open_default().unwrap());
//! let load = ProcStatLoad::new(cpu.core_count());
//! let controller = Amd10Cpu::new(&cpu, Box::new(SysfsPciBus::new()), Box::new(load), settings).unwrap();
//!
//! controller.update();
//! for sensor in controller.sensors() {
//!     println!("{}: {:?}", sensor.name(), sensor.value());
//! }
//! ```

// Grouped modules
pub mod hw;
pub mod sensor;

// Standalone modules
pub mod constants;
pub mod error;
pub mod identifier;
pub mod settings;
pub mod visitor;

// Re-export error types
pub use error::{HypersenseError, Result};

pub use identifier::Identifier;

// Re-export sensor types
pub use sensor::{Parameter, ParameterDescription, Sensor, SensorBuilder, SensorHistory, SensorType, SensorValue};

// Re-export hardware types
pub use hw::{
    ActiveSensors, Amd10Cpu, CpuDescriptor, CpuLoad, Hardware, HardwareType, PciAddress, PciBus, ProcStatLoad,
    SensorEvent, SensorObserver, SysfsPciBus,
};

pub use settings::{JsonSettings, MemorySettings, Settings};

pub use visitor::{Element, MinMaxReset, ParameterReading, ReadingCollector, SensorReading, Visitor};
