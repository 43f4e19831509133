//! Bounded sensor history
//!
//! Raw readings are averaged in groups of [`DOWNSAMPLE_WINDOW`] before they are
//! stored, and stored points older than [`RETENTION`] are dropped from the front.
//! Together the two bound memory regardless of how long the process runs.
//!
//! [`DOWNSAMPLE_WINDOW`]: crate::constants::history::DOWNSAMPLE_WINDOW
//! [`RETENTION`]: crate::constants::history::RETENTION

use std::collections::VecDeque;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Serialize, Serializer};

use crate::constants::history::{DOWNSAMPLE_WINDOW, INITIAL_CAPACITY, RETENTION};

/// One downsampled history point
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensorValue {
    /// Average of the raw readings folded into this point
    pub value: f32,
    /// Time of the last raw reading in the group
    #[serde(serialize_with = "serialize_epoch_ms")]
    pub time: SystemTime,
}

impl SensorValue {
    pub fn new(value: f32, time: SystemTime) -> Self {
        Self { value, time }
    }
}

fn serialize_epoch_ms<S: Serializer>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error> {
    let ms = time
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    serializer.serialize_u64(ms)
}

/// Time-bounded, downsampled series of readings for one sensor
#[derive(Debug, Clone)]
pub struct SensorHistory {
    values: VecDeque<SensorValue>,
    retention: Duration,
    sum: f32,
    count: u32,
}

impl SensorHistory {
    /// History with the standard two hour retention window
    pub fn new() -> Self {
        Self::with_retention(RETENTION)
    }

    /// History with a custom retention window
    pub fn with_retention(retention: Duration) -> Self {
        Self {
            values: VecDeque::with_capacity(INITIAL_CAPACITY),
            retention,
            sum: 0.0,
            count: 0,
        }
    }

    /// Drop every point older than the retention window relative to `now`.
    ///
    /// Points are ordered by time, so this stops at the first point still inside
    /// the window. Points stamped after `now` are never considered expired.
    pub fn trim(&mut self, now: SystemTime) {
        while let Some(oldest) = self.values.front() {
            match now.duration_since(oldest.time) {
                Ok(age) if age > self.retention => {
                    self.values.pop_front();
                }
                _ => break,
            }
        }
    }

    /// Fold a raw reading into the downsampling accumulator.
    ///
    /// Every [`DOWNSAMPLE_WINDOW`]th reading appends the group average, stamped
    /// with `now`. Returns the appended point, if any.
    ///
    /// [`DOWNSAMPLE_WINDOW`]: crate::constants::history::DOWNSAMPLE_WINDOW
    pub fn accumulate(&mut self, value: f32, now: SystemTime) -> Option<SensorValue> {
        self.sum += value;
        self.count += 1;
        if self.count < DOWNSAMPLE_WINDOW {
            return None;
        }

        // Wall clock may step backwards; keep timestamps non-decreasing
        let time = match self.values.back() {
            Some(last) if last.time > now => last.time,
            _ => now,
        };
        let point = SensorValue::new(self.sum / self.count as f32, time);
        self.values.push_back(point);
        self.sum = 0.0;
        self.count = 0;
        Some(point)
    }

    /// Trim then accumulate; absent readings only trim.
    pub fn record(&mut self, value: Option<f32>, now: SystemTime) -> Option<SensorValue> {
        self.trim(now);
        value.and_then(|v| self.accumulate(v, now))
    }

    /// Throw away a partially filled accumulator without storing it
    pub fn discard_pending(&mut self) {
        self.sum = 0.0;
        self.count = 0;
    }

    /// Raw readings waiting in the accumulator
    pub fn pending(&self) -> u32 {
        self.count
    }

    /// Stored points, oldest first. Each call starts a fresh iteration.
    pub fn iter(&self) -> impl Iterator<Item = &SensorValue> + '_ {
        self.values.iter()
    }

    /// Copy of the stored points, oldest first
    pub fn to_vec(&self) -> Vec<SensorValue> {
        self.values.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }
}

impl Default for SensorHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a SensorHistory {
    type Item = &'a SensorValue;
    type IntoIter = std::collections::vec_deque::Iter<'a, SensorValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
