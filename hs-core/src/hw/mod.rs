//! Hardware interaction modules
//!
//! Contains the hardware controller abstraction, the low-level access traits
//! controllers poll through, and the concrete controllers.
//!
//! - `pci` - PCI configuration space lookup and register reads
//! - `load` - per-core CPU load sources
//! - `active` - active sensor set and add/remove notifications
//! - `cpu` - CPU identification and CPU controllers

pub mod active;
pub mod cpu;
pub mod load;
pub mod pci;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::identifier::Identifier;
use crate::sensor::Sensor;
use crate::visitor::Element;

pub use active::{ActiveSensors, SensorEvent, SensorObserver};
pub use cpu::{Amd10Cpu, CpuDescriptor};
pub use load::{CpuLoad, ProcStatLoad};
pub use pci::{PciAddress, PciBus, SysfsPciBus};

/// Device category, used by front-ends to pick an icon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HardwareType {
    Mainboard,
    SuperIo,
    Cpu,
    Gpu,
    Storage,
}

impl HardwareType {
    /// Icon name in the freedesktop naming scheme
    pub fn icon(&self) -> &'static str {
        match self {
            HardwareType::Mainboard => "computer",
            HardwareType::SuperIo => "media-flash",
            HardwareType::Cpu => "cpu",
            HardwareType::Gpu => "video-display",
            HardwareType::Storage => "drive-harddisk",
        }
    }
}

impl fmt::Display for HardwareType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HardwareType::Mainboard => "Mainboard",
            HardwareType::SuperIo => "Super I/O",
            HardwareType::Cpu => "CPU",
            HardwareType::Gpu => "GPU",
            HardwareType::Storage => "Storage",
        };
        f.write_str(name)
    }
}

/// One physical device owning a fixed set of sensors.
///
/// `update` is driven by an external scheduler and must not run concurrently
/// with itself on the same instance. Everything else may be called at any time.
pub trait Hardware: Element + Send + Sync {
    /// Display name
    fn name(&self) -> &str;

    /// Category of the device, for presentation
    fn hardware_type(&self) -> HardwareType;

    /// Stable device identifier, e.g. `/amdcpu/0`
    fn identifier(&self) -> &Identifier;

    /// Currently active sensors; sensors without hardware support never appear here
    fn sensors(&self) -> Vec<Arc<Sensor>>;

    /// Poll the hardware once and reconcile the active set
    fn update(&self);

    /// Register an observer for sensor activation/deactivation
    fn subscribe(&self, observer: SensorObserver);
}
