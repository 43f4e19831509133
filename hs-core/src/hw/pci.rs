//! PCI configuration space access
//!
//! Controllers locate a PCI function once by vendor/device ID and then read
//! 32-bit registers from its configuration space on every update.
//!
//! # Addresses
//!
//! A [`PciAddress`] packs bus, device and function as
//! `bus << 8 | device << 3 | function`. Lookups that find nothing return
//! [`PciAddress::NOT_FOUND`] instead of an error, and controllers check for it
//! on every update.
//!
//! # Permissions
//!
//! Linux only exposes the first 64 bytes of configuration space to
//! unprivileged users; higher offsets need root.

use std::fmt;
use std::fs;
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::constants::{paths, pci};
use crate::error::{HypersenseError, Result};

/// Packed bus/device/function address of a PCI function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PciAddress(u32);

impl PciAddress {
    /// Sentinel for "no such device"
    pub const NOT_FOUND: PciAddress = PciAddress(pci::ADDRESS_NOT_FOUND);

    pub fn new(bus: u8, device: u8, function: u8) -> Self {
        Self(((bus as u32) << 8) | (((device as u32) & 0x1F) << 3) | ((function as u32) & 0x07))
    }

    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u32 {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        *self != Self::NOT_FOUND
    }

    pub fn bus(&self) -> u8 {
        ((self.0 >> 8) & 0xFF) as u8
    }

    pub fn device(&self) -> u8 {
        ((self.0 >> 3) & 0x1F) as u8
    }

    pub fn function(&self) -> u8 {
        (self.0 & 0x07) as u8
    }
}

impl fmt::Display for PciAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{:02x}:{:02x}.{:x}", self.bus(), self.device(), self.function())
        } else {
            f.write_str("not found")
        }
    }
}

/// Register-level access to PCI configuration space
#[cfg_attr(test, mockall::automock)]
pub trait PciBus: Send + Sync {
    /// Address of the `index`th function matching the IDs, or [`PciAddress::NOT_FOUND`]
    fn find_device_by_id(&self, vendor_id: u16, device_id: u16, index: usize) -> PciAddress;

    /// Read the dword at `offset`. Any failure means "not readable right now".
    fn read_config_dword(&self, address: PciAddress, offset: u32) -> Result<u32>;
}

// ============================================================================
// Linux sysfs implementation
// ============================================================================

/// PCI access through `/sys/bus/pci/devices/<domain:bus:dev.fn>/config`.
///
/// Only PCI domain 0 is addressable.
#[derive(Debug, Clone)]
pub struct SysfsPciBus {
    root: PathBuf,
}

impl SysfsPciBus {
    pub fn new() -> Self {
        Self::with_root(paths::PCI_DEVICES_BASE)
    }

    /// Use a different device directory (tests, chroots)
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn device_dir(&self, address: PciAddress) -> PathBuf {
        self.root.join(format!(
            "0000:{:02x}:{:02x}.{:x}",
            address.bus(),
            address.device(),
            address.function()
        ))
    }
}

impl Default for SysfsPciBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a sysfs device directory name such as `0000:00:18.3`
pub fn parse_device_name(name: &str) -> Option<PciAddress> {
    let (domain, rest) = name.split_once(':')?;
    if u16::from_str_radix(domain, 16).ok()? != 0 {
        return None;
    }
    let (bus, rest) = rest.split_once(':')?;
    let (device, function) = rest.split_once('.')?;

    let bus = u8::from_str_radix(bus, 16).ok()?;
    let device = u8::from_str_radix(device, 16).ok()?;
    let function = u8::from_str_radix(function, 16).ok()?;
    if device > 0x1F || function > 0x07 {
        return None;
    }
    Some(PciAddress::new(bus, device, function))
}

fn read_id(path: &Path) -> Option<u16> {
    let content = fs::read_to_string(path).ok()?;
    let trimmed = content.trim();
    let hex = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    u16::from_str_radix(hex, 16).ok()
}

impl PciBus for SysfsPciBus {
    fn find_device_by_id(&self, vendor_id: u16, device_id: u16, index: usize) -> PciAddress {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Cannot scan {:?}: {}", self.root, e);
                return PciAddress::NOT_FOUND;
            }
        };

        // Sort so the index is stable across runs
        let mut matches: Vec<PciAddress> = entries
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name();
                let address = parse_device_name(&name.to_string_lossy())?;
                let dir = entry.path();
                let vendor = read_id(&dir.join("vendor"))?;
                let device = read_id(&dir.join("device"))?;
                (vendor == vendor_id && device == device_id).then_some(address)
            })
            .collect();
        matches.sort_by_key(|a| a.raw());

        match matches.get(index) {
            Some(address) => {
                debug!("Found PCI device {:04x}:{:04x} at {}", vendor_id, device_id, address);
                *address
            }
            None => {
                debug!("PCI device {:04x}:{:04x} #{} not present", vendor_id, device_id, index);
                PciAddress::NOT_FOUND
            }
        }
    }

    fn read_config_dword(&self, address: PciAddress, offset: u32) -> Result<u32> {
        if !address.is_valid() {
            return Err(HypersenseError::register_read(address.raw(), offset, "no device address"));
        }
        if offset % 4 != 0 {
            return Err(HypersenseError::register_read(address.raw(), offset, "unaligned offset"));
        }

        let path = self.device_dir(address).join("config");
        let file = fs::File::open(&path)
            .map_err(|e| HypersenseError::register_read(address.raw(), offset, e.to_string()))?;

        let mut buf = [0u8; 4];
        file.read_exact_at(&mut buf, offset as u64).map_err(|e| {
            // SAFETY: geteuid has no preconditions and cannot fail
            let root = unsafe { libc::geteuid() } == 0;
            let reason = if offset >= pci::UNPRIVILEGED_CONFIG_SIZE && !root {
                format!("{} (offsets past 0x40 require root)", e)
            } else {
                e.to_string()
            };
            HypersenseError::register_read(address.raw(), offset, reason)
        })?;

        let value = u32::from_le_bytes(buf);
        trace!("PCI {} [{:#04x}] = {:#010x}", address, offset, value);
        Ok(value)
    }
}
