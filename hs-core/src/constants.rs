//! Constants and configuration values for Hypersense
//!
//! Centralizes all magic numbers, paths, and configuration defaults.
//! Add new register offsets and device IDs here rather than inline.

use std::time::Duration;

/// System paths
pub mod paths {
    /// Base path for PCI devices in sysfs
    pub const PCI_DEVICES_BASE: &str = "/sys/bus/pci/devices";

    /// Per-core CPU time accounting
    pub const PROC_STAT: &str = "/proc/stat";

    /// CPU identification data
    pub const PROC_CPUINFO: &str = "/proc/cpuinfo";

    /// Application directory name under the user config dir
    pub const APP_DIR: &str = "hypersense";

    /// Sensor settings file (name overrides, parameter overrides)
    pub const SETTINGS_FILE: &str = "settings.json";

    /// Daemon configuration file
    pub const CONFIG_FILE: &str = "config.json";

    /// systemd journal socket, present when journald is running
    pub const JOURNALD_SOCKET: &str = "/run/systemd/journal/socket";

    /// Default location of the settings file: `~/.config/hypersense/settings.json`
    pub fn default_settings_path() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join(SETTINGS_FILE))
    }

    /// Default location of the daemon config: `~/.config/hypersense/config.json`
    pub fn default_config_path() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE))
    }
}

/// Sensor history retention and downsampling
pub mod history {
    use super::*;

    /// Maximum age of a stored history point, in minutes
    pub const RETENTION_MINUTES: u64 = 120;

    /// Maximum age of a stored history point
    pub const RETENTION: Duration = Duration::from_secs(RETENTION_MINUTES * 60);

    /// Number of raw samples averaged into one history point
    pub const DOWNSAMPLE_WINDOW: u32 = 4;

    /// Points reserved up front (enough for a 4 Hz poll rate over the retention window)
    pub const INITIAL_CAPACITY: usize = (RETENTION_MINUTES as usize) * 15;
}

/// PCI identifiers and registers
pub mod pci {
    /// Sentinel returned by device lookups when nothing matched
    pub const ADDRESS_NOT_FOUND: u32 = 0xFFFF_FFFF;

    /// Size of the standard (non-extended) configuration header readable without root
    pub const UNPRIVILEGED_CONFIG_SIZE: u32 = 64;

    /// AMD PCI vendor ID
    pub const AMD_VENDOR_ID: u16 = 0x1022;

    /// AMD family 10h miscellaneous control device (function 3)
    pub const AMD_10H_MISCELLANEOUS_DEVICE_ID: u16 = 0x1203;

    /// Reported temperature control register of the family 10h misc device
    pub const REPORTED_TEMPERATURE_CONTROL_REGISTER: u32 = 0xA4;
}

/// CPU identification
pub mod cpu {
    /// Vendor string reported by AMD processors
    pub const AMD_VENDOR: &str = "AuthenticAMD";

    /// AMD family 10h (K10)
    pub const AMD_FAMILY_10H: u32 = 0x10;

    /// Extended CPUID leaf holding the core count (0x8000_0008)
    pub const EXT_LEAF_CORE_COUNT: usize = 8;
}

/// Polling defaults and limits
pub mod polling {
    /// Default interval between hardware updates
    pub const DEFAULT_INTERVAL_MS: u64 = 1000;

    /// Fastest accepted poll interval
    pub const MIN_INTERVAL_MS: u64 = 100;

    /// Slowest accepted poll interval
    pub const MAX_INTERVAL_MS: u64 = 60_000;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retention_is_two_hours() {
        assert_eq!(history::RETENTION, Duration::from_secs(7200));
    }

    #[test]
    fn test_initial_capacity() {
        assert_eq!(history::INITIAL_CAPACITY, 1800);
    }

    #[test]
    fn test_default_interval_in_range() {
        assert!(polling::DEFAULT_INTERVAL_MS >= polling::MIN_INTERVAL_MS);
        assert!(polling::DEFAULT_INTERVAL_MS <= polling::MAX_INTERVAL_MS);
    }
}
