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

//! Hypersense - hardware telemetry daemon for Linux
//!
//! This library wires the `hs_core` sensor model into a running service:
//! daemon configuration, logging setup, the poll scheduler and sensor event
//! logging.

pub mod config;
pub mod events;
pub mod logger;
pub mod scheduler;

pub use config::DaemonConfig;
pub use scheduler::PollScheduler;
