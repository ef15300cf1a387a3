// ABOUTME: Reading fetch and normalization against the latest-glucose endpoint
// ABOUTME: Parses epochs, drops readings not newer than the baseline, and sorts ascending
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use tracing::debug;

use crate::constants::fetch;
use crate::errors::ShareResult;
use crate::gateway::SessionId;
use crate::models::{RawReading, Reading};
use crate::session::SessionManager;

/// Window and count overrides for a single read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Minutes of history to request (default one day)
    pub minutes: Option<u32>,
    /// Maximum readings to request (default 1000)
    pub max_count: Option<u32>,
}

impl ReadOptions {
    /// Only the single most recent reading
    #[must_use]
    pub const fn latest() -> Self {
        Self {
            minutes: None,
            max_count: Some(1),
        }
    }

    /// Everything from the last `minutes`
    #[must_use]
    pub const fn last_minutes(minutes: u32) -> Self {
        Self {
            minutes: Some(minutes),
            max_count: None,
        }
    }

    /// Cap the number of readings requested
    #[must_use]
    pub const fn with_max_count(mut self, max_count: u32) -> Self {
        self.max_count = Some(max_count);
        self
    }

    /// `(minutes, max_count)` with defaults applied
    #[must_use]
    pub fn resolve(self) -> (u32, u32) {
        (
            self.minutes
                .unwrap_or(fetch::DEFAULT_MINUTES)
                .clamp(1, fetch::MAX_MINUTES),
            self.max_count.unwrap_or(fetch::DEFAULT_MAX_COUNT).max(1),
        )
    }
}

/// Fetch readings newer than `since_epoch` using `session`
///
/// Returns an empty vector, not an error, when nothing new exists. Any
/// gateway failure invalidates `session` before being returned, so the next
/// caller logs in again.
///
/// # Errors
///
/// Propagates the gateway's `ShareError` unchanged.
pub async fn fetch_since(
    sessions: &SessionManager,
    session: &SessionId,
    since_epoch: i64,
    options: ReadOptions,
) -> ShareResult<Vec<Reading>> {
    let (minutes, max_count) = options.resolve();
    match sessions
        .gateway()
        .fetch_latest(session, minutes, max_count)
        .await
    {
        Ok(raw) => Ok(normalize(raw, since_epoch)),
        Err(err) => {
            debug!(error = %err, "read failed, dropping session");
            sessions.invalidate(session).await;
            Err(err)
        }
    }
}

/// Keep readings strictly newer than `since_epoch`, ascending, one per epoch
///
/// The service does not guarantee order and may repeat a record.
#[must_use]
pub fn normalize(raw: Vec<RawReading>, since_epoch: i64) -> Vec<Reading> {
    let mut readings: Vec<Reading> = raw
        .into_iter()
        .map(Reading::from)
        .filter(|reading| reading.epoch_ms > since_epoch)
        .collect();
    readings.sort_by_key(|reading| reading.epoch_ms);
    readings.dedup_by_key(|reading| reading.epoch_ms);
    readings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Trend;

    fn raw(epoch: i64, value: u16) -> RawReading {
        RawReading {
            display_time: format!("/Date({epoch}-0700)/"),
            system_time: format!("/Date({epoch})/"),
            wire_time: format!("/Date({epoch})/"),
            trend: Trend::Flat,
            value,
        }
    }

    fn epochs(readings: &[Reading]) -> Vec<i64> {
        readings.iter().map(|r| r.epoch_ms).collect()
    }

    #[test]
    fn test_sorts_ascending() {
        let out = normalize(vec![raw(100, 1), raw(300, 3), raw(200, 2)], 0);
        assert_eq!(epochs(&out), vec![100, 200, 300]);
    }

    #[test]
    fn test_filters_not_newer_than_baseline() {
        let out = normalize(vec![raw(100, 1), raw(300, 3), raw(400, 4)], 300);
        assert_eq!(epochs(&out), vec![400]);
    }

    #[test]
    fn test_drops_duplicate_epochs() {
        let out = normalize(vec![raw(200, 2), raw(100, 1), raw(200, 2)], 0);
        assert_eq!(epochs(&out), vec![100, 200]);
    }

    #[test]
    fn test_unparsable_time_never_passes_baseline() {
        let mut bad = raw(0, 9);
        bad.wire_time = "garbage".to_owned();
        assert!(normalize(vec![bad], 0).is_empty());
    }

    #[test]
    fn test_read_options_resolve() {
        assert_eq!(ReadOptions::default().resolve(), (1440, 1000));
        assert_eq!(ReadOptions::latest().resolve(), (1440, 1));
        assert_eq!(ReadOptions::last_minutes(15).resolve(), (15, 1000));
        assert_eq!(ReadOptions::last_minutes(0).resolve(), (1, 1000));
        assert_eq!(ReadOptions::last_minutes(5000).with_max_count(3).resolve(), (1440, 3));
    }
}
