//! CPU identification and CPU controllers

pub mod amd10;

use std::fs;

use crate::constants::{cpu, paths};
use crate::error::{HypersenseError, Result};

pub use amd10::Amd10Cpu;

/// Identification data for one CPU package
#[derive(Debug, Clone, PartialEq)]
pub struct CpuDescriptor {
    pub vendor: String,
    pub name: String,
    pub family: u32,
    pub model: u32,
    pub stepping: u32,
    core_count: usize,
}

impl CpuDescriptor {
    /// Build from raw CPUID data.
    ///
    /// `extended` holds the extended leaves (0x8000_0000 onwards) as
    /// `[eax, ebx, ecx, edx]`. The core count comes from ECX of leaf
    /// 0x8000_0008 when present, otherwise a single core is assumed.
    pub fn from_cpuid(
        vendor: impl Into<String>,
        name: impl Into<String>,
        family: u32,
        model: u32,
        stepping: u32,
        extended: &[[u32; 4]],
    ) -> Self {
        let core_count = extended
            .get(cpu::EXT_LEAF_CORE_COUNT)
            .map(|leaf| ((leaf[2] & 0xFF) + 1) as usize)
            .unwrap_or(1);

        Self {
            vendor: vendor.into(),
            name: name.into(),
            family,
            model,
            stepping,
            core_count,
        }
    }

    /// Build from the first processor block of `/proc/cpuinfo` text
    pub fn from_cpuinfo(content: &str) -> Result<Self> {
        let mut vendor = None;
        let mut name = None;
        let mut family = None;
        let mut model = None;
        let mut stepping = None;
        let mut cores = None;

        for line in content.lines() {
            // Blank line ends the first processor block
            if line.trim().is_empty() {
                if vendor.is_some() {
                    break;
                }
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "vendor_id" => vendor = Some(value.to_string()),
                "model name" => name = Some(value.to_string()),
                "cpu family" => family = value.parse::<u32>().ok(),
                "model" => model = value.parse::<u32>().ok(),
                "stepping" => stepping = value.parse::<u32>().ok(),
                "cpu cores" => cores = value.parse::<usize>().ok(),
                _ => {}
            }
        }

        let missing = |field: &str| HypersenseError::NotSupported(format!("cpuinfo lacks {}", field));
        Ok(Self {
            vendor: vendor.ok_or_else(|| missing("vendor_id"))?,
            name: name.unwrap_or_else(|| "Unknown CPU".to_string()),
            family: family.ok_or_else(|| missing("cpu family"))?,
            model: model.unwrap_or(0),
            stepping: stepping.unwrap_or(0),
            core_count: cores.filter(|&c| c > 0).unwrap_or(1),
        })
    }

    /// Read and parse `/proc/cpuinfo`
    pub fn read_local() -> Result<Self> {
        let content = fs::read_to_string(paths::PROC_CPUINFO).map_err(|source| HypersenseError::FileRead {
            path: paths::PROC_CPUINFO.into(),
            source,
        })?;
        Self::from_cpuinfo(&content)
    }

    /// Physical cores in the package
    pub fn core_count(&self) -> usize {
        self.core_count
    }

    pub fn is_amd_family_10h(&self) -> bool {
        self.vendor == cpu::AMD_VENDOR && self.family == cpu::AMD_FAMILY_10H
    }
}
