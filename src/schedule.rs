// ABOUTME: Poll Scheduler computing how long to wait for the next transmitter upload
// ABOUTME: Clock abstraction plus cadence-based wait and adaptive read-window sizing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! The transmitter samples every five minutes and the reading takes a few
//! seconds to reach the service. Sleeping until `last + cadence + margin`
//! avoids polling for data that cannot exist yet. The wait is advisory only;
//! the dedup filter is what keeps the stream correct.

use std::time::Duration;

use chrono::Utc;

use crate::constants::fetch;

/// Source of "now" in epoch milliseconds
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch
    fn now_millis(&self) -> i64;
}

/// Wall clock of the host
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Cadence-based wait computation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    wait_time: Duration,
}

impl WaitPolicy {
    /// Wait `wait_time` (cadence plus upload margin) after each reading
    #[must_use]
    pub const fn new(wait_time: Duration) -> Self {
        Self { wait_time }
    }

    /// Configured cadence plus margin
    #[must_use]
    pub const fn wait_time(&self) -> Duration {
        self.wait_time
    }

    /// Time to sleep before the next fetch
    ///
    /// Zero when nothing has been emitted yet or the next reading is already due.
    #[must_use]
    pub fn compute_wait(&self, last_emitted_epoch: Option<i64>, now_ms: i64) -> Duration {
        let Some(last) = last_emitted_epoch else {
            return Duration::ZERO;
        };
        let target = last.saturating_add(self.wait_time.as_millis() as i64);
        let remaining = target.saturating_sub(now_ms);
        if remaining > 0 {
            Duration::from_millis(remaining as u64)
        } else {
            Duration::ZERO
        }
    }
}

/// Minutes of history that cover everything since `last_epoch`
///
/// Rounded up and clamped to what the service accepts.
#[must_use]
pub fn fetch_window_minutes(last_epoch: i64, now_ms: i64) -> u32 {
    let elapsed = now_ms.saturating_sub(last_epoch).max(0);
    let minutes = (elapsed + fetch::MS_PER_MINUTE - 1) / fetch::MS_PER_MINUTE;
    minutes.clamp(1, i64::from(fetch::MAX_MINUTES)) as u32
}
