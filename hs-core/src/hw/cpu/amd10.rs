//! AMD family 10h CPU controller
//!
//! Exposes one package temperature read from the miscellaneous control PCI
//! function, plus per-core and total load from a [`CpuLoad`] source.
//!
//! # Temperature register
//!
//! Register `0xA4` (Reported Temperature Control) holds the current
//! temperature in bits 31:21, in units of 1/8 °C.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, trace};

use crate::constants::pci;
use crate::error::Result;
use crate::hw::active::{ActiveSensors, SensorObserver};
use crate::hw::load::CpuLoad;
use crate::hw::pci::{PciAddress, PciBus};
use crate::hw::{CpuDescriptor, Hardware, HardwareType};
use crate::identifier::Identifier;
use crate::sensor::{Sensor, SensorType};
use crate::settings::Settings;
use crate::visitor::{Element, Visitor};

/// Decode the Reported Temperature Control register into °C
pub fn decode_temperature(raw: u32) -> f32 {
    ((raw >> 21) & 0x7FF) as f32 / 8.0
}

/// Controller for one AMD family 10h package
pub struct Amd10Cpu {
    name: String,
    identifier: Identifier,
    pci_address: PciAddress,
    bus: Box<dyn PciBus>,
    load: Mutex<Box<dyn CpuLoad>>,
    core_temperature: Arc<Sensor>,
    total_load: Arc<Sensor>,
    core_loads: Vec<Arc<Sensor>>,
    active: ActiveSensors,
}

impl Amd10Cpu {
    /// Discover the sensor topology and run a first update.
    ///
    /// Load sensors are activated here if the load source is available; the
    /// temperature sensor is activated by the first successful register read.
    pub fn new(
        cpu: &CpuDescriptor,
        bus: Box<dyn PciBus>,
        load: Box<dyn CpuLoad>,
        settings: Arc<dyn Settings>,
    ) -> Result<Self> {
        let identifier = Identifier::new(["amdcpu", "0"])?;
        let core_count = cpu.core_count();

        let total_load = Arc::new(Sensor::new("CPU Total", 0, SensorType::Load, &identifier, settings.clone())?);
        let core_loads = (0..core_count)
            .map(|i| {
                Sensor::new(format!("Core #{}", i + 1), i + 1, SensorType::Load, &identifier, settings.clone())
                    .map(Arc::new)
            })
            .collect::<Result<Vec<_>>>()?;

        // Family 10h reports a single temperature for the whole package
        let temperature_name = if core_count > 1 {
            format!("Core #1 - #{}", core_count)
        } else {
            "Core".to_string()
        };
        let core_temperature = Arc::new(Sensor::new(
            temperature_name,
            0,
            SensorType::Temperature,
            &identifier,
            settings,
        )?);

        let pci_address = bus.find_device_by_id(pci::AMD_VENDOR_ID, pci::AMD_10H_MISCELLANEOUS_DEVICE_ID, 0);
        if pci_address.is_valid() {
            info!("{}: miscellaneous control device at {}", cpu.name, pci_address);
        } else {
            info!("{}: miscellaneous control device not found, temperature disabled", cpu.name);
        }

        let controller = Self {
            name: cpu.name.clone(),
            identifier,
            pci_address,
            bus,
            load: Mutex::new(load),
            core_temperature,
            total_load,
            core_loads,
            active: ActiveSensors::new(),
        };

        if controller.load.lock().is_available() {
            for sensor in &controller.core_loads {
                controller.active.activate(sensor);
            }
            controller.active.activate(&controller.total_load);
        } else {
            debug!("{}: CPU load unavailable, load sensors stay inactive", controller.name);
        }

        controller.update();
        Ok(controller)
    }

    /// Address of the miscellaneous control function, possibly `NOT_FOUND`
    pub fn pci_address(&self) -> PciAddress {
        self.pci_address
    }

    pub fn core_temperature(&self) -> &Arc<Sensor> {
        &self.core_temperature
    }

    pub fn total_load(&self) -> &Arc<Sensor> {
        &self.total_load
    }

    pub fn core_loads(&self) -> &[Arc<Sensor>] {
        &self.core_loads
    }

    /// Every sensor this controller owns, active or not
    pub fn all_sensors(&self) -> Vec<Arc<Sensor>> {
        let mut sensors = Vec::with_capacity(self.core_loads.len() + 2);
        sensors.push(self.core_temperature.clone());
        sensors.push(self.total_load.clone());
        sensors.extend(self.core_loads.iter().cloned());
        sensors
    }

    fn update_temperature(&self) {
        if !self.pci_address.is_valid() {
            return;
        }

        match self
            .bus
            .read_config_dword(self.pci_address, pci::REPORTED_TEMPERATURE_CONTROL_REGISTER)
        {
            Ok(raw) => {
                let celsius = decode_temperature(raw);
                trace!("{}: temperature {:.3} °C (raw {:#010x})", self.name, celsius, raw);
                self.core_temperature.set_value(Some(celsius));
                self.active.activate(&self.core_temperature);
            }
            Err(e) => {
                debug!("{}: temperature read failed: {}", self.name, e);
                if self.active.deactivate(&self.core_temperature) {
                    self.core_temperature.discard_pending();
                }
            }
        }
    }

    fn update_load(&self) {
        let mut load = self.load.lock();
        if !load.is_available() {
            return;
        }

        load.update();
        for (i, sensor) in self.core_loads.iter().enumerate() {
            sensor.set_value(Some(load.core_load(i)));
        }
        self.total_load.set_value(Some(load.total_load()));
    }
}

impl Hardware for Amd10Cpu {
    fn name(&self) -> &str {
        &self.name
    }

    fn hardware_type(&self) -> HardwareType {
        HardwareType::Cpu
    }

    fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    fn sensors(&self) -> Vec<Arc<Sensor>> {
        self.active.snapshot()
    }

    fn update(&self) {
        self.update_temperature();
        self.update_load();
    }

    fn subscribe(&self, observer: SensorObserver) {
        self.active.subscribe(observer);
    }
}

impl Element for Amd10Cpu {
    fn accept(&self, visitor: &mut dyn Visitor) {
        visitor.visit_hardware(self);
    }

    fn traverse(&self, visitor: &mut dyn Visitor) {
        for sensor in self.active.snapshot() {
            sensor.accept(visitor);
        }
    }
}

impl std::fmt::Debug for Amd10Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Amd10Cpu")
            .field("name", &self.name)
            .field("identifier", &self.identifier)
            .field("pci_address", &self.pci_address)
            .field("cores", &self.core_loads.len())
            .field("active", &self.active)
            .finish()
    }
}
