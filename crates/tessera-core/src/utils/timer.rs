// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A monotonic stopwatch.

use std::time::{Duration, Instant};

/// Measures elapsed wall-clock time from the moment it was started.
///
/// Backed by [`Instant`], so readings never go backwards. The scheduler's
/// [`SystemClock`](crate::scheduler::SystemClock) and the telemetry scoped
/// timers are both built on it.
#[derive(Debug, Clone)]
pub struct Stopwatch {
    start_time: Option<Instant>,
}

impl Stopwatch {
    /// Creates a new stopwatch that starts counting immediately.
    #[inline]
    pub fn new() -> Self {
        Self {
            start_time: Some(Instant::now()),
        }
    }

    /// Restarts the stopwatch from zero.
    #[inline]
    pub fn restart(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Returns the elapsed time since the stopwatch was started.
    ///
    /// Returns `None` if the stopwatch has not been started.
    #[inline]
    pub fn elapsed(&self) -> Option<Duration> {
        self.start_time.map(|start| start.elapsed())
    }

    /// Returns the elapsed time in whole milliseconds.
    #[inline]
    pub fn elapsed_ms(&self) -> Option<u64> {
        self.elapsed().map(|d| d.as_millis() as u64)
    }

    /// Returns the elapsed time in seconds as `f64`.
    #[inline]
    pub fn elapsed_secs_f64(&self) -> Option<f64> {
        self.elapsed().map(|d| d.as_secs_f64())
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}
