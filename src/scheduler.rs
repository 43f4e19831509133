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

//! Poll scheduler
//!
//! Drives `update()` on every registered hardware controller at a fixed
//! interval. Controllers are updated in registration order, one at a time, so
//! a controller never sees concurrent updates.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use hs_core::{Element, Hardware, Visitor};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace};

#[derive(Default)]
pub struct PollScheduler {
    hardware: Vec<Arc<dyn Hardware>>,
}

impl PollScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, hardware: Arc<dyn Hardware>) {
        info!("Polling {} {} ({})", hardware.hardware_type(), hardware.name(), hardware.identifier());
        self.hardware.push(hardware);
    }

    pub fn hardware(&self) -> &[Arc<dyn Hardware>] {
        &self.hardware
    }

    pub fn is_empty(&self) -> bool {
        self.hardware.is_empty()
    }

    /// Update every controller once
    pub fn tick(&self) {
        let start = Instant::now();
        for hardware in &self.hardware {
            hardware.update();
        }
        trace!("Poll cycle over {} controllers took {:?}", self.hardware.len(), start.elapsed());
    }

    /// Dispatch `visitor` to every controller
    pub fn accept(&self, visitor: &mut dyn Visitor) {
        for hardware in &self.hardware {
            hardware.accept(visitor);
        }
    }

    /// Tick every `interval` until `shutdown` is set.
    ///
    /// The flag is checked before each tick, so at most one cycle runs after
    /// shutdown is requested. Returns the number of completed cycles.
    pub async fn run(&self, interval: Duration, shutdown: Arc<AtomicBool>) -> u64 {
        info!("Poll loop starting ({:?} interval)", interval);

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut cycles: u64 = 0;

        loop {
            ticker.tick().await;
            if shutdown.load(Ordering::SeqCst) {
                break;
            }
            self.tick();
            cycles += 1;
        }

        debug!("Poll loop stopped after {} cycles", cycles);
        cycles
    }
}

impl std::fmt::Debug for PollScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollScheduler")
            .field("hardware", &self.hardware.iter().map(|h| h.name()).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hs_core::{HardwareType, Identifier, Sensor, SensorObserver};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    struct CountingHardware {
        name: String,
        identifier: Identifier,
        updates: AtomicUsize,
        order: Arc<Mutex<Vec<String>>>,
        stop_after: Option<(usize, Arc<AtomicBool>)>,
    }

    impl CountingHardware {
        fn new(name: &str, order: Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                name: name.to_string(),
                identifier: Identifier::new(["counting", name]).unwrap(),
                updates: AtomicUsize::new(0),
                order,
                stop_after: None,
            }
        }
    }

    impl Element for CountingHardware {
        fn accept(&self, visitor: &mut dyn Visitor) {
            visitor.visit_hardware(self);
        }

        fn traverse(&self, _visitor: &mut dyn Visitor) {}
    }

    impl Hardware for CountingHardware {
        fn name(&self) -> &str {
            &self.name
        }

        fn hardware_type(&self) -> HardwareType {
            HardwareType::Mainboard
        }

        fn identifier(&self) -> &Identifier {
            &self.identifier
        }

        fn sensors(&self) -> Vec<Arc<Sensor>> {
            Vec::new()
        }

        fn update(&self) {
            let n = self.updates.fetch_add(1, Ordering::SeqCst) + 1;
            self.order.lock().unwrap().push(self.name.clone());
            if let Some((limit, flag)) = &self.stop_after {
                if n >= *limit {
                    flag.store(true, Ordering::SeqCst);
                }
            }
        }

        fn subscribe(&self, _observer: SensorObserver) {}
    }

    #[test]
    fn test_tick_updates_in_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut scheduler = PollScheduler::new();
        scheduler.add(Arc::new(CountingHardware::new("a", order.clone())));
        scheduler.add(Arc::new(CountingHardware::new("b", order.clone())));

        scheduler.tick();
        scheduler.tick();

        assert_eq!(*order.lock().unwrap(), vec!["a", "b", "a", "b"]);
    }

    #[test]
    fn test_accept_reaches_every_controller() {
        struct Names(Vec<String>);
        impl Visitor for Names {
            fn visit_hardware(&mut self, hardware: &dyn Hardware) {
                self.0.push(hardware.name().to_string());
            }
            fn visit_sensor(&mut self, _sensor: &Sensor) {}
        }

        let order = Arc::new(Mutex::new(Vec::new()));
        let mut scheduler = PollScheduler::new();
        scheduler.add(Arc::new(CountingHardware::new("x", order.clone())));
        scheduler.add(Arc::new(CountingHardware::new("y", order)));

        let mut names = Names(Vec::new());
        scheduler.accept(&mut names);
        assert_eq!(names.0, vec!["x", "y"]);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let shutdown = Arc::new(AtomicBool::new(false));
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut hardware = CountingHardware::new("cpu", order);
        hardware.stop_after = Some((3, shutdown.clone()));
        let hardware = Arc::new(hardware);

        let mut scheduler = PollScheduler::new();
        scheduler.add(hardware.clone());

        let cycles = scheduler.run(Duration::from_millis(1), shutdown).await;
        assert_eq!(cycles, 3);
        assert_eq!(hardware.updates.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_run_with_shutdown_already_set() {
        let scheduler = PollScheduler::new();
        let cycles = scheduler.run(Duration::from_millis(1), Arc::new(AtomicBool::new(true))).await;
        assert_eq!(cycles, 0);
    }
}
