// ABOUTME: Stream Engine turning the latest-readings API into an ordered, de-duplicated stream
// ABOUTME: Wait/fetch/emit loop exposed as futures::Stream alongside read, wait, and reset
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Stream Engine
//!
//! [`ShareClient::readings`] returns an unbounded `Stream` that repeats:
//!
//! 1. **Waiting**: sleep until the next reading is expected (zero on first run)
//! 2. **Fetching**: ensure a session and read everything newer than the last
//!    emitted reading, retrying with backoff while the batch is empty
//! 3. **Emitting**: record each reading as the new baseline, then yield it
//!
//! The loop never ends on its own; drop the stream to cancel it. A batch
//! that has not been yielded yet is discarded with the stream. The cached
//! session survives cancellation.
//!
//! `read`, `wait`, and `reset` operate on the same baseline as the stream and
//! may be called between (or during) stream polls.
//!
//! ## Example
//!
//! ```rust,no_run
//! use futures_util::StreamExt;
//! use dexcom_share::config::ShareConfig;
//! use dexcom_share::stream::ShareClient;
//!
//! # async fn example() -> dexcom_share::errors::ShareResult<()> {
//! let client = ShareClient::new(ShareConfig::from_env()?)?;
//! let mut readings = client.readings();
//! while let Some(reading) = readings.next().await {
//!     println!("{}", reading?);
//! }
//! # Ok(())
//! # }
//! ```

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_stream::try_stream;
use futures_util::Stream;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::ShareConfig;
use crate::errors::{ShareError, ShareResult};
use crate::fetch::{fetch_since, ReadOptions};
use crate::gateway::{HttpShareGateway, ShareGateway};
use crate::models::Reading;
use crate::retry::{with_retry, RetryError};
use crate::schedule::{fetch_window_minutes, Clock, SystemClock, WaitPolicy};
use crate::session::SessionManager;

/// Type alias for the stream returned by [`ShareClient::readings`]
pub type ReadingStream<'a> = Pin<Box<dyn Stream<Item = ShareResult<Reading>> + Send + 'a>>;

/// Polling client for one Share account
///
/// Holds the session credential and the dedup baseline (the most recently
/// emitted reading). The baseline only moves forward unless [`reset`](Self::reset)
/// clears it.
pub struct ShareClient {
    config: ShareConfig,
    sessions: SessionManager,
    wait_policy: WaitPolicy,
    clock: Arc<dyn Clock>,
    latest: Mutex<Option<Reading>>,
}

impl ShareClient {
    /// Create a client talking to the real Share service
    ///
    /// # Errors
    ///
    /// Returns `ShareError::Config` if the configuration is invalid or the
    /// HTTP client cannot be built.
    pub fn new(config: ShareConfig) -> ShareResult<Self> {
        config.validate()?;
        let gateway = HttpShareGateway::new(&config)?;
        Ok(Self::with_gateway(config, Arc::new(gateway)))
    }

    /// Create a client over any gateway implementation
    #[must_use]
    pub fn with_gateway(config: ShareConfig, gateway: Arc<dyn ShareGateway>) -> Self {
        let sessions = SessionManager::new(gateway, config.credentials(), config.login_policy());
        Self {
            wait_policy: WaitPolicy::new(config.wait_time),
            sessions,
            config,
            clock: Arc::new(SystemClock),
            latest: Mutex::new(None),
        }
    }

    /// Replace the wall clock used for pacing
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Configuration this client was built with
    #[must_use]
    pub const fn config(&self) -> &ShareConfig {
        &self.config
    }

    /// Session manager shared by the stream and `read`
    #[must_use]
    pub const fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Most recently emitted reading, if any
    pub async fn latest_reading(&self) -> Option<Reading> {
        self.latest.lock().await.clone()
    }

    /// Read immediately, without waiting for the cadence
    ///
    /// Only readings newer than the current baseline are returned, ascending.
    /// The newest of them becomes the baseline, so the stream and [`wait`](Self::wait)
    /// pace themselves from it.
    ///
    /// # Errors
    ///
    /// Returns the login or read error. A read error also drops the session.
    pub async fn read(&self, options: ReadOptions) -> ShareResult<Vec<Reading>> {
        let since = self.baseline_epoch().await;
        let session = self.sessions.ensure_session().await?;
        let readings = fetch_since(&self.sessions, &session, since, options).await?;

        if let Some(newest) = readings.last() {
            info!(count = readings.len(), epoch_ms = newest.epoch_ms, "read readings");
            self.advance_baseline(newest).await;
        }
        Ok(readings)
    }

    /// Sleep until the next reading is expected and return how long that was
    ///
    /// Returns immediately with zero when nothing has been emitted yet or the
    /// next reading is already overdue.
    pub async fn wait(&self) -> Duration {
        let last = self.baseline().await;
        let delay = self
            .wait_policy
            .compute_wait(last, self.clock.now_millis());

        if delay.is_zero() {
            if let Some(last) = last {
                let age_ms = self.clock.now_millis().saturating_sub(last);
                debug!(
                    age_ms,
                    wait_ms = self.wait_policy.wait_time().as_millis() as u64,
                    "no wait, last reading is already a cadence old"
                );
            }
        } else {
            debug!(wait_ms = delay.as_millis() as u64, "waiting for next reading");
            tokio::time::sleep(delay).await;
        }
        delay
    }

    /// Forget the baseline so the next fetch treats every reading as new
    pub async fn reset(&self) {
        *self.latest.lock().await = None;
        debug!("baseline reset");
    }

    /// Unbounded stream of new readings in strictly increasing time order
    ///
    /// The stream yields an error and ends when login is rejected or the poll
    /// retry budget runs out.
    pub fn readings(&self) -> ReadingStream<'_> {
        Box::pin(try_stream! {
            loop {
                self.wait().await;

                let policy = self.config.poll_policy();
                let batch = with_retry("poll", &policy, move |_| async move {
                    self.poll_once().await.map_err(RetryError::classify)
                })
                .await?;
                debug!(count = batch.len(), "got new readings");

                for reading in batch {
                    if self.try_advance(&reading).await {
                        yield reading;
                    }
                }
            }
        })
    }

    /// One fetch attempt for the stream; an empty batch counts as a failure
    async fn poll_once(&self) -> ShareResult<Vec<Reading>> {
        let last = self.baseline().await;
        let options = match last {
            Some(last) => {
                ReadOptions::last_minutes(fetch_window_minutes(last, self.clock.now_millis()))
            }
            None => ReadOptions::latest(),
        };

        let session = self.sessions.ensure_session().await?;
        let batch = fetch_since(&self.sessions, &session, last.unwrap_or(0), options).await?;
        if batch.is_empty() {
            return Err(ShareError::NoNewData);
        }
        Ok(batch)
    }

    /// Record `reading` as emitted if it is newer than the live baseline
    async fn try_advance(&self, reading: &Reading) -> bool {
        let mut latest = self.latest.lock().await;
        let baseline = latest.as_ref().map_or(0, |r| r.epoch_ms);
        if reading.epoch_ms > baseline {
            *latest = Some(reading.clone());
            true
        } else {
            debug!(
                epoch_ms = reading.epoch_ms,
                baseline, "skipping reading not newer than the latest"
            );
            false
        }
    }

    async fn advance_baseline(&self, newest: &Reading) {
        let mut latest = self.latest.lock().await;
        if latest.as_ref().is_none_or(|r| newest.epoch_ms > r.epoch_ms) {
            *latest = Some(newest.clone());
        }
    }

    async fn baseline(&self) -> Option<i64> {
        self.latest.lock().await.as_ref().map(|r| r.epoch_ms)
    }

    async fn baseline_epoch(&self) -> i64 {
        self.baseline().await.unwrap_or(0)
    }
}
