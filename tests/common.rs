// ABOUTME: Shared test utilities for session and stream integration tests
// ABOUTME: Provides a scripted in-memory Share gateway, a paused-time clock, and reading builders
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    missing_docs,
    dead_code,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `dexcom_share`
//!
//! [`ScriptedGateway`] replays queued login and fetch outcomes and counts the
//! calls made against it. Once a queue runs dry, logins succeed with a fresh
//! session id and fetches return an empty batch.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use dexcom_share::models::{RawReading, Trend};
use dexcom_share::schedule::Clock;
use dexcom_share::{
    AccountCredentials, SessionId, ShareClient, ShareConfig, ShareError, ShareGateway, ShareResult,
};

/// Wall-clock origin for tests: 2023-11-14T22:13:20Z
pub const BASE_EPOCH_MS: i64 = 1_700_000_000_000;

/// One recorded call to `fetch_latest`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCall {
    pub session: String,
    pub minutes: u32,
    pub max_count: u32,
}

#[derive(Default)]
pub struct ScriptedGateway {
    logins: Mutex<VecDeque<ShareResult<String>>>,
    fetches: Mutex<VecDeque<ShareResult<Vec<RawReading>>>>,
    login_calls: AtomicUsize,
    fetch_log: Mutex<Vec<FetchCall>>,
    login_delay: Duration,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every login take `delay` of (paused) time
    pub fn with_login_delay(mut self, delay: Duration) -> Self {
        self.login_delay = delay;
        self
    }

    pub fn push_login(&self, outcome: ShareResult<&str>) -> &Self {
        self.logins
            .lock()
            .unwrap()
            .push_back(outcome.map(str::to_owned));
        self
    }

    pub fn push_fetch(&self, outcome: ShareResult<Vec<RawReading>>) -> &Self {
        self.fetches.lock().unwrap().push_back(outcome);
        self
    }

    pub fn push_batch(&self, epochs: &[i64]) -> &Self {
        self.push_fetch(Ok(epochs.iter().map(|&e| raw_reading(e, 100)).collect()))
    }

    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> Vec<FetchCall> {
        self.fetch_log.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_log.lock().unwrap().len()
    }
}

#[async_trait]
impl ShareGateway for ScriptedGateway {
    async fn authenticate(&self, _credentials: &AccountCredentials) -> ShareResult<SessionId> {
        let call = self.login_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.login_delay.is_zero() {
            tokio::time::sleep(self.login_delay).await;
        }
        let scripted = self.logins.lock().unwrap().pop_front();
        scripted
            .unwrap_or_else(|| Ok(format!("session-{call}")))
            .map(SessionId::new)
    }

    async fn fetch_latest(
        &self,
        session: &SessionId,
        minutes: u32,
        max_count: u32,
    ) -> ShareResult<Vec<RawReading>> {
        self.fetch_log.lock().unwrap().push(FetchCall {
            session: session.as_str().to_owned(),
            minutes,
            max_count,
        });
        let scripted = self.fetches.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Clock that starts at `BASE_EPOCH_MS` and follows tokio's (pausable) time
pub struct PausedClock {
    base_ms: i64,
    start: tokio::time::Instant,
}

impl PausedClock {
    pub fn new() -> Self {
        Self::starting_at(BASE_EPOCH_MS)
    }

    pub fn starting_at(base_ms: i64) -> Self {
        Self {
            base_ms,
            start: tokio::time::Instant::now(),
        }
    }
}

impl Clock for PausedClock {
    fn now_millis(&self) -> i64 {
        self.base_ms + self.start.elapsed().as_millis() as i64
    }
}

pub fn raw_reading(epoch_ms: i64, value: u16) -> RawReading {
    RawReading {
        display_time: format!("/Date({epoch_ms}-0700)/"),
        system_time: format!("/Date({epoch_ms})/"),
        wire_time: format!("/Date({epoch_ms})/"),
        trend: Trend::Flat,
        value,
    }
}

/// Configuration with short backoffs so paused-time tests stay readable
pub fn test_config() -> ShareConfig {
    ShareConfig::new("alice", "hunter2")
        .with_backoff(Duration::from_millis(10), Duration::from_millis(50))
        .with_login_retries(3)
        .with_poll_retries(3)
}

/// Client over `gateway` with a paused-time clock
pub fn test_client(config: ShareConfig, gateway: &Arc<ScriptedGateway>) -> ShareClient {
    let gateway: Arc<dyn ShareGateway> = gateway.clone();
    ShareClient::with_gateway(config, gateway).with_clock(Arc::new(PausedClock::new()))
}

pub fn transient() -> ShareError {
    ShareError::Network("connection reset".to_owned())
}

pub fn rejected() -> ShareError {
    ShareError::auth_rejected("AuthenticatePasswordInvalid", "Account password invalid.")
}
