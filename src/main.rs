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

//! Hypersense Daemon (hypersensed)
//!
//! Discovers supported sensor hardware, polls it at a fixed interval and logs
//! sensor activation changes. With `--once` it polls a single cycle and prints
//! every active sensor as JSON.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use hs_core::{
    Amd10Cpu, CpuDescriptor, Hardware, JsonSettings, MemorySettings, ProcStatLoad, ReadingCollector, Settings,
    SysfsPciBus,
};
use hypersense::config::{self, DaemonConfig, LOG_ENV};
use hypersense::{events, logger, PollScheduler};
use tracing::{debug, error, info, warn};

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// CLI
// ============================================================================

fn print_help() {
    eprintln!("hypersensed {} - Hypersense hardware telemetry daemon", VERSION);
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("    hypersensed [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("    -c, --config PATH   Config file (default: ~/.config/hypersense/config.json)");
    eprintln!("        --once          Poll once, print sensors as JSON and exit");
    eprintln!("    -v, --version       Print version");
    eprintln!("    -h, --help          Print this help");
    eprintln!();
    eprintln!("ENVIRONMENT:");
    eprintln!("    HYPERSENSE_LOG      Log level (trace, debug, info, warn, error)");
}

fn print_version() {
    println!("hypersensed {}", VERSION);
}

struct Options {
    config_path: Option<PathBuf>,
    once: bool,
}

fn parse_args() -> Options {
    let args: Vec<String> = std::env::args().collect();
    let mut options = Options {
        config_path: None,
        once: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            "-c" | "--config" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(1);
                }
                options.config_path = Some(PathBuf::from(&args[i]));
            }
            "--once" => options.once = true,
            arg => {
                eprintln!("Unknown argument: {}", arg);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }
    options
}

// ============================================================================
// Setup
// ============================================================================

fn open_settings(config: &DaemonConfig) -> Arc<dyn Settings> {
    let Some(path) = config.settings_path() else {
        warn!("No config directory; sensor names and parameters will not persist");
        return Arc::new(MemorySettings::new());
    };

    match JsonSettings::open(&path) {
        Ok(settings) => {
            info!("STARTUP: Settings at {:?}", settings.path());
            Arc::new(settings)
        }
        Err(e) => {
            error!("Could not load settings from {:?}: {}; using in-memory settings", path, e);
            Arc::new(MemorySettings::new())
        }
    }
}

/// Build a controller for every supported device on this machine
fn discover_hardware(settings: Arc<dyn Settings>) -> anyhow::Result<Vec<Arc<dyn Hardware>>> {
    let cpu = CpuDescriptor::read_local().context("reading CPU identification")?;
    debug!(
        "CPU: {} (vendor {}, family {:#x}, model {}, stepping {}, {} cores)",
        cpu.name,
        cpu.vendor,
        cpu.family,
        cpu.model,
        cpu.stepping,
        cpu.core_count()
    );

    let mut hardware: Vec<Arc<dyn Hardware>> = Vec::new();
    if cpu.is_amd_family_10h() {
        let load = ProcStatLoad::new(cpu.core_count());
        let controller = Amd10Cpu::new(&cpu, Box::new(SysfsPciBus::new()), Box::new(load), settings)
            .context("initializing AMD family 10h controller")?;
        hardware.push(Arc::new(controller));
    } else {
        info!("No supported sensor hardware found for {}", cpu.name);
    }
    Ok(hardware)
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let options = parse_args();

    let config = match &options.config_path {
        Some(path) => DaemonConfig::load(path),
        None => DaemonConfig::load_default(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            let path = options.config_path.clone().or_else(config::config_path);
            eprintln!("Error: invalid config {:?}: {}", path, e);
            std::process::exit(1);
        }
    };

    let log_level = config.log_level(std::env::var(LOG_ENV).ok());
    let target = logger::init(&log_level);

    info!("STARTUP: hypersensed {} starting", VERSION);
    info!("STARTUP: Logging to {} at {}", target, log_level);

    // SAFETY: geteuid has no preconditions and cannot fail
    if unsafe { libc::geteuid() } != 0 {
        warn!("STARTUP: Not running as root; PCI temperature registers may be unreadable");
    }

    let settings = open_settings(&config);
    let mut scheduler = PollScheduler::new();
    for hardware in discover_hardware(settings)? {
        events::log_sensor_events(hardware.as_ref());
        for sensor in hardware.sensors() {
            info!("{}: sensor active '{}' ({})", hardware.name(), sensor.name(), sensor.identifier());
        }
        scheduler.add(hardware);
    }

    if options.once {
        // Load is a delta between two samples; wait one interval before reading
        tokio::time::sleep(config.poll_interval()).await;
        scheduler.tick();

        let mut collector = ReadingCollector::new();
        scheduler.accept(&mut collector);
        println!("{}", serde_json::to_string_pretty(collector.readings())?);
        return Ok(());
    }

    if scheduler.is_empty() {
        warn!("Nothing to poll, exiting");
        return Ok(());
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("SIGNAL: Received SIGINT/SIGTERM - initiating shutdown");
        shutdown_flag.store(true, Ordering::SeqCst);
    }) {
        warn!("Failed to set signal handler: {}. Shutdown via signals may not work cleanly.", e);
    }

    scheduler.run(config.poll_interval(), shutdown).await;
    info!("SHUTDOWN: hypersensed terminated gracefully");
    Ok(())
}
