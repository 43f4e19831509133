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

//! Logging setup
//!
//! Prefers the systemd journal when its socket exists and falls back to a
//! plain `fmt` subscriber on stdout.

use std::fmt;
use std::path::Path;

use hs_core::constants::paths;
use tracing_subscriber::EnvFilter;

/// Where log records end up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Journald,
    Stdout,
}

impl fmt::Display for LogTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogTarget::Journald => write!(f, "systemd journal"),
            LogTarget::Stdout => write!(f, "stdout"),
        }
    }
}

/// Install the global subscriber with `level` as the filter directive.
///
/// Must be called once, before any other tracing output.
pub fn init(level: &str) -> LogTarget {
    if Path::new(paths::JOURNALD_SOCKET).exists() {
        match tracing_journald::layer() {
            Ok(journald_layer) => {
                use tracing_subscriber::prelude::*;
                tracing_subscriber::registry()
                    .with(journald_layer)
                    .with(EnvFilter::new(level))
                    .init();
                return LogTarget::Journald;
            }
            Err(e) => {
                eprintln!("Failed to create journald layer: {}, falling back to stdout", e);
            }
        }
    }

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_env_filter(EnvFilter::new(level))
        .init();
    LogTarget::Stdout
}
