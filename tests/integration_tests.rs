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

//! Integration tests for Hypersense
//!
//! These tests drive a full controller through the public API: settings
//! persistence, the poll scheduler, visitors and daemon configuration.

use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hs_core::{
    Amd10Cpu, CpuDescriptor, CpuLoad, Hardware, JsonSettings, MinMaxReset, PciAddress, PciBus, ReadingCollector,
    SensorEvent, Settings,
};
use hs_error::HypersenseError;
use hypersense::config::{DaemonConfig, LOG_ENV};
use hypersense::PollScheduler;
use mockall::mock;
use serial_test::serial;
use tempfile::TempDir;

mock! {
    pub Bus {}
    impl PciBus for Bus {
        fn find_device_by_id(&self, vendor_id: u16, device_id: u16, index: usize) -> PciAddress;
        fn read_config_dword(&self, address: PciAddress, offset: u32) -> hs_error::Result<u32>;
    }
}

/// Load source that reports a fixed load per core
struct FixedLoad {
    loads: Vec<f32>,
    updates: usize,
}

impl CpuLoad for FixedLoad {
    fn is_available(&self) -> bool {
        true
    }

    fn update(&mut self) {
        self.updates += 1;
    }

    fn core_load(&self, index: usize) -> f32 {
        self.loads.get(index).copied().unwrap_or(0.0)
    }

    fn total_load(&self) -> f32 {
        self.loads.iter().sum::<f32>() / self.loads.len() as f32
    }
}

fn phenom_x2() -> CpuDescriptor {
    CpuDescriptor::from_cpuinfo(
        "vendor_id : AuthenticAMD\ncpu family : 16\nmodel : 6\nmodel name : AMD Athlon II X2\nstepping : 3\ncpu cores : 2\n",
    )
    .unwrap()
}

fn raw_temperature(celsius: f32) -> u32 {
    ((celsius * 8.0) as u32) << 21
}

/// Bus exposing the misc device at 00:18.3 with a steady temperature
fn steady_bus(celsius: f32) -> MockBus {
    let mut bus = MockBus::new();
    bus.expect_find_device_by_id()
        .returning(|_, _, _| PciAddress::new(0, 0x18, 3));
    bus.expect_read_config_dword()
        .returning(move |_, _| Ok(raw_temperature(celsius)));
    bus
}

fn controller(bus: MockBus, settings: Arc<dyn Settings>) -> Arc<Amd10Cpu> {
    let load = FixedLoad { loads: vec![20.0, 60.0], updates: 0 };
    Arc::new(Amd10Cpu::new(&phenom_x2(), Box::new(bus), Box::new(load), settings).unwrap())
}

#[test]
fn test_full_poll_cycle() {
    let dir = TempDir::new().unwrap();
    let settings: Arc<dyn Settings> = Arc::new(JsonSettings::open(dir.path().join("settings.json")).unwrap());
    let cpu = controller(steady_bus(55.0), settings);

    let mut scheduler = PollScheduler::new();
    scheduler.add(cpu.clone());
    // Constructor already ran one update
    for _ in 0..7 {
        scheduler.tick();
    }

    let names: Vec<String> = cpu.sensors().iter().map(|s| s.name()).collect();
    assert_eq!(names, vec!["Core #1", "Core #2", "CPU Total", "Core #1 - #2"]);

    let temperature = cpu.core_temperature();
    assert_eq!(temperature.value(), Some(55.0));
    assert_eq!(temperature.values().len(), 2);
    assert_eq!(cpu.total_load().value(), Some(40.0));
    assert_eq!(cpu.core_loads()[1].max(), Some(60.0));
}

#[test]
fn test_sensor_names_survive_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");

    {
        let settings: Arc<dyn Settings> = Arc::new(JsonSettings::open(&path).unwrap());
        let cpu = controller(steady_bus(40.0), settings);
        cpu.core_loads()[0].set_name("Left core");
    }

    let settings: Arc<dyn Settings> = Arc::new(JsonSettings::open(&path).unwrap());
    assert_eq!(settings.get("/amdcpu/0/load/1/name", ""), "Left core");

    let cpu = controller(steady_bus(40.0), settings);
    assert_eq!(cpu.core_loads()[0].name(), "Left core");
    assert_eq!(cpu.core_loads()[1].name(), "Core #2");

    cpu.core_loads()[0].set_name("");
    assert_eq!(cpu.core_loads()[0].name(), "Core #1");
}

#[test]
fn test_unreadable_register_hides_temperature() {
    let dir = TempDir::new().unwrap();
    let settings: Arc<dyn Settings> = Arc::new(JsonSettings::open(dir.path().join("settings.json")).unwrap());

    let mut bus = MockBus::new();
    bus.expect_find_device_by_id()
        .returning(|_, _, _| PciAddress::new(0, 0x18, 3));
    bus.expect_read_config_dword()
        .returning(|a, o| Err(HypersenseError::register_read(a.raw(), o, "permission denied")));

    let cpu = controller(bus, settings);
    let removed = Arc::new(AtomicBool::new(false));
    let flag = removed.clone();
    cpu.subscribe(Box::new(move |event| {
        if matches!(event, SensorEvent::Removed(_)) {
            flag.store(true, Ordering::SeqCst);
        }
    }));

    cpu.update();
    assert_eq!(cpu.sensors().len(), 3);
    assert!(cpu.sensors().iter().all(|s| !Arc::ptr_eq(s, cpu.core_temperature())));
    assert!(!removed.load(Ordering::SeqCst));
}

#[test]
fn test_snapshot_json() {
    let settings: Arc<dyn Settings> = Arc::new(hs_core::MemorySettings::new());
    let cpu = controller(steady_bus(61.25), settings);

    let mut scheduler = PollScheduler::new();
    scheduler.add(cpu);

    let mut collector = ReadingCollector::new();
    scheduler.accept(&mut collector);
    let json: serde_json::Value = serde_json::to_value(collector.readings()).unwrap();

    let readings = json.as_array().unwrap();
    assert_eq!(readings.len(), 4);
    let temperature = readings
        .iter()
        .find(|r| r["identifier"] == "/amdcpu/0/temperature/0")
        .unwrap();
    assert_eq!(temperature["value"], 61.25);
    assert_eq!(temperature["hardware"], "/amdcpu/0");
    assert_eq!(temperature["sensor_type"], "temperature");
}

#[test]
fn test_min_max_reset_across_scheduler() {
    let settings: Arc<dyn Settings> = Arc::new(hs_core::MemorySettings::new());
    let cpu = controller(steady_bus(50.0), settings);

    let mut scheduler = PollScheduler::new();
    scheduler.add(cpu.clone());

    let mut reset = MinMaxReset::new();
    scheduler.accept(&mut reset);
    assert_eq!(reset.count(), 4);
    assert_eq!(cpu.core_temperature().min(), None);

    scheduler.tick();
    assert_eq!(cpu.core_temperature().min(), Some(50.0));
}

#[tokio::test]
async fn test_scheduler_runs_until_shutdown() {
    let settings: Arc<dyn Settings> = Arc::new(hs_core::MemorySettings::new());
    let cpu = controller(steady_bus(45.0), settings);

    let mut scheduler = PollScheduler::new();
    scheduler.add(cpu.clone());

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    // Stop once the first downsampled history point exists
    let temperature = cpu.core_temperature().clone();
    let watcher = tokio::spawn(async move {
        while temperature.values().is_empty() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        flag.store(true, Ordering::SeqCst);
    });

    let cycles = scheduler.run(Duration::from_millis(1), shutdown).await;
    watcher.await.unwrap();

    assert!(cycles >= 3);
    assert!(!cpu.core_temperature().values().is_empty());
}

#[test]
#[serial]
fn test_config_file_and_environment() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(
        &path,
        format!(
            r#"{{ "poll_interval_ms": 200, "settings_path": "{}" }}"#,
            dir.path().join("sensors.json").display()
        ),
    )
    .unwrap();

    std::env::set_var(LOG_ENV, "debug");
    let config = DaemonConfig::load(&path).unwrap();
    assert_eq!(config.poll_interval(), Duration::from_millis(200));
    assert_eq!(config.log_level(std::env::var(LOG_ENV).ok()), "debug");
    std::env::remove_var(LOG_ENV);
    assert_eq!(config.log_level(std::env::var(LOG_ENV).ok()), "info");

    let settings = JsonSettings::open(config.settings_path().unwrap()).unwrap();
    settings.set("/amdcpu/0/temperature/0/name", "Package");
    assert!(dir.path().join("sensors.json").exists());
}
