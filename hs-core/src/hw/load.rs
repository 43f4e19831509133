//! Per-core CPU load
//!
//! A [`CpuLoad`] source is recomputed once per poll cycle and then queried for
//! each core and for the total. Loads are percentages (0-100).

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::constants::paths;

/// Source of per-core and total CPU load
#[cfg_attr(test, mockall::automock)]
pub trait CpuLoad: Send + Sync {
    /// Whether load data can be obtained on this platform at all
    fn is_available(&self) -> bool;

    /// Recompute loads from the time elapsed since the previous call
    fn update(&mut self);

    /// Load of core `index` in percent
    fn core_load(&self, index: usize) -> f32;

    /// Average load over all cores in percent
    fn total_load(&self) -> f32;
}

/// Cumulative busy/idle jiffies of one CPU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CpuTimes {
    pub idle: u64,
    pub total: u64,
}

/// Parse the per-core `cpuN` lines of `/proc/stat`, ordered by N.
///
/// The aggregate `cpu` line is skipped. Idle time counts `idle + iowait`.
pub fn parse_proc_stat(content: &str) -> Vec<CpuTimes> {
    let mut cores: Vec<(usize, CpuTimes)> = content
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let label = parts.next()?;
            let index = label.strip_prefix("cpu")?.parse::<usize>().ok()?;

            // user nice system idle iowait irq softirq steal
            let fields: Vec<u64> = parts.take(8).filter_map(|s| s.parse().ok()).collect();
            if fields.len() < 4 {
                return None;
            }
            let idle = fields[3] + fields.get(4).copied().unwrap_or(0);
            let total = fields.iter().sum();
            Some((index, CpuTimes { idle, total }))
        })
        .collect();
    cores.sort_by_key(|(index, _)| *index);
    cores.into_iter().map(|(_, times)| times).collect()
}

/// Load fraction between two samples, as a percentage
fn load_between(previous: CpuTimes, current: CpuTimes) -> Option<f32> {
    let total = current.total.checked_sub(previous.total)?;
    let idle = current.idle.checked_sub(previous.idle)?;
    if total == 0 {
        return None;
    }
    let busy = 1.0 - (idle.min(total) as f64 / total as f64);
    Some((busy * 100.0) as f32)
}

/// [`CpuLoad`] backed by `/proc/stat`
#[derive(Debug)]
pub struct ProcStatLoad {
    path: PathBuf,
    core_count: usize,
    available: bool,
    previous: Vec<CpuTimes>,
    loads: Vec<f32>,
    total: f32,
}

impl ProcStatLoad {
    /// Track the first `core_count` CPUs listed in `/proc/stat`
    pub fn new(core_count: usize) -> Self {
        Self::with_path(paths::PROC_STAT, core_count)
    }

    pub fn with_path(path: impl Into<PathBuf>, core_count: usize) -> Self {
        let path = path.into();
        let previous = Self::sample(&path, core_count);
        let available = previous.is_some();
        if !available {
            debug!("CPU load unavailable: {:?} lacks {} per-core entries", path, core_count);
        }

        Self {
            path,
            core_count,
            available,
            previous: previous.unwrap_or_default(),
            loads: vec![0.0; core_count],
            total: 0.0,
        }
    }

    fn sample(path: &Path, core_count: usize) -> Option<Vec<CpuTimes>> {
        let content = fs::read_to_string(path).ok()?;
        let mut times = parse_proc_stat(&content);
        if core_count == 0 || times.len() < core_count {
            return None;
        }
        times.truncate(core_count);
        Some(times)
    }
}

impl CpuLoad for ProcStatLoad {
    fn is_available(&self) -> bool {
        self.available
    }

    fn update(&mut self) {
        if !self.available {
            return;
        }
        let Some(current) = Self::sample(&self.path, self.core_count) else {
            warn!("Failed to sample {:?}; keeping previous loads", self.path);
            return;
        };

        for (i, (prev, cur)) in self.previous.iter().zip(&current).enumerate() {
            if let Some(load) = load_between(*prev, *cur) {
                self.loads[i] = load;
            }
        }
        self.total = self.loads.iter().sum::<f32>() / self.core_count as f32;
        self.previous = current;
    }

    fn core_load(&self, index: usize) -> f32 {
        self.loads.get(index).copied().unwrap_or(0.0)
    }

    fn total_load(&self) -> f32 {
        self.total
    }
}
