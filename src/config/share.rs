// ABOUTME: Share client configuration with region selection and polling/backoff tuning
// ABOUTME: Builder-style overrides plus environment loading with safe fallbacks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::env;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{env_config, service, timing};
use crate::errors::{ShareError, ShareResult};
use crate::retry::RetryPolicy;

/// Placeholder written in place of secrets in `Debug` output
const REDACTED: &str = "[REDACTED]";

/// Which Share deployment the account lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    /// Accounts registered in the United States
    #[default]
    Us,
    /// Accounts registered anywhere else
    OutsideUs,
}

impl Region {
    /// Base URL of the Share web services for this region
    #[must_use]
    pub const fn base_url(self) -> &'static str {
        match self {
            Self::Us => service::BASE_URL_US,
            Self::OutsideUs => service::BASE_URL_OUTSIDE_US,
        }
    }
}

/// Identity sent to the login endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct AccountCredentials {
    /// Share account name (the publisher's username)
    pub account_name: String,
    /// Account password
    pub password: String,
    /// Application id presented to the service
    pub application_id: String,
}

impl fmt::Debug for AccountCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountCredentials")
            .field("account_name", &self.account_name)
            .field("password", &REDACTED)
            .field("application_id", &self.application_id)
            .finish()
    }
}

/// Configuration for one Share client instance
#[derive(Clone)]
pub struct ShareConfig {
    /// Share account name
    pub account_name: String,
    /// Account password
    pub password: String,
    /// Application id override; the official client's id is used when `None`
    pub application_id: Option<String>,
    /// Deployment the account lives on
    pub region: Region,
    /// Explicit base URL, taking precedence over `region`
    pub base_url: Option<String>,
    /// User agent presented on every request
    pub user_agent: String,
    /// Sampling cadence plus upload margin; the stream sleeps this long after the last reading
    pub wait_time: Duration,
    /// Smallest delay between poll retries
    pub min_backoff: Duration,
    /// Largest delay between poll retries
    pub max_backoff: Duration,
    /// Random stretch of each retry delay, as a fraction of the delay
    pub retry_jitter: f64,
    /// Login attempts before the last error is surfaced
    pub login_retries: u32,
    /// Poll attempts before the stream gives up waiting for a new reading
    pub poll_retries: u32,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// TCP/TLS connect timeout
    pub connect_timeout: Duration,
}

impl ShareConfig {
    /// Create a configuration for the given account with every other value defaulted
    #[must_use]
    pub fn new(account_name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            account_name: account_name.into(),
            password: password.into(),
            application_id: None,
            region: Region::default(),
            base_url: None,
            user_agent: service::USER_AGENT.to_owned(),
            wait_time: Duration::from_secs(timing::CADENCE_SECS + timing::UPLOAD_MARGIN_SECS),
            min_backoff: Duration::from_millis(timing::MIN_BACKOFF_MS),
            max_backoff: Duration::from_millis(timing::MAX_BACKOFF_MS),
            retry_jitter: timing::RETRY_JITTER,
            login_retries: timing::LOGIN_RETRIES,
            poll_retries: timing::POLL_RETRIES,
            request_timeout: Duration::from_secs(timing::REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(timing::CONNECT_TIMEOUT_SECS),
        }
    }

    /// Load configuration from environment variables
    ///
    /// Unparsable numeric values fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ShareError::Config` if the username or password variable is unset.
    pub fn from_env() -> ShareResult<Self> {
        let account_name = env::var(env_config::USERNAME)
            .map_err(|_| ShareError::config(format!("{} is not set", env_config::USERNAME)))?;
        let password = env::var(env_config::PASSWORD)
            .map_err(|_| ShareError::config(format!("{} is not set", env_config::PASSWORD)))?;

        Ok(Self::new(account_name, password).with_env_overrides())
    }

    /// Apply every optional `DEXCOM_SHARE_*` variable that is set
    ///
    /// Credentials are left untouched.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(application_id) = env::var(env_config::APPLICATION_ID) {
            self.application_id = Some(application_id);
        }
        if let Ok(base_url) = env::var(env_config::BASE_URL) {
            self.base_url = Some(base_url);
        }
        if env::var(env_config::OUTSIDE_US)
            .is_ok_and(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
        {
            self.region = Region::OutsideUs;
        }
        if let Some(secs) = env_parse::<u64>(env_config::WAIT_SECS) {
            self.wait_time = Duration::from_secs(secs);
        }
        if let Some(ms) = env_parse::<u64>(env_config::MIN_BACKOFF_MS) {
            self.min_backoff = Duration::from_millis(ms);
        }
        if let Some(ms) = env_parse::<u64>(env_config::MAX_BACKOFF_MS) {
            self.max_backoff = Duration::from_millis(ms);
        }
        if let Some(jitter) = env_parse::<f64>(env_config::RETRY_JITTER) {
            self = self.with_retry_jitter(jitter);
        }
        self
    }

    /// Use a specific application id
    #[must_use]
    pub fn with_application_id(mut self, application_id: impl Into<String>) -> Self {
        self.application_id = Some(application_id.into());
        self
    }

    /// Select the deployment region
    #[must_use]
    pub const fn with_region(mut self, region: Region) -> Self {
        self.region = region;
        self
    }

    /// Point the client at an explicit base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Override the cadence-plus-margin wait
    #[must_use]
    pub const fn with_wait_time(mut self, wait_time: Duration) -> Self {
        self.wait_time = wait_time;
        self
    }

    /// Override the poll backoff bounds
    #[must_use]
    pub const fn with_backoff(mut self, min_backoff: Duration, max_backoff: Duration) -> Self {
        self.min_backoff = min_backoff;
        self.max_backoff = max_backoff;
        self
    }

    /// Override the retry jitter fraction, clamped to `0.0..=1.0`
    #[must_use]
    pub fn with_retry_jitter(mut self, jitter: f64) -> Self {
        self.retry_jitter = if jitter.is_finite() {
            jitter.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self
    }

    /// Override the login attempt bound
    #[must_use]
    pub const fn with_login_retries(mut self, retries: u32) -> Self {
        self.login_retries = retries;
        self
    }

    /// Override the poll attempt bound
    #[must_use]
    pub const fn with_poll_retries(mut self, retries: u32) -> Self {
        self.poll_retries = retries;
        self
    }

    /// Resolved base URL, without a trailing slash
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.region.base_url())
            .trim_end_matches('/')
    }

    /// Credentials presented to the login endpoint
    #[must_use]
    pub fn credentials(&self) -> AccountCredentials {
        AccountCredentials {
            account_name: self.account_name.clone(),
            password: self.password.clone(),
            application_id: self
                .application_id
                .clone()
                .unwrap_or_else(|| service::APPLICATION_ID.to_owned()),
        }
    }

    /// Retry policy for login attempts
    #[must_use]
    pub fn login_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.login_retries,
            Duration::from_millis(timing::LOGIN_MIN_BACKOFF_MS).min(self.max_backoff),
            self.max_backoff,
        )
        .with_jitter(self.retry_jitter)
    }

    /// Retry policy for "poll until a new reading appears"
    #[must_use]
    pub fn poll_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.poll_retries, self.min_backoff, self.max_backoff)
            .with_jitter(self.retry_jitter)
    }

    /// Check the configuration for values that can never work
    ///
    /// # Errors
    ///
    /// Returns `ShareError::Config` for empty credentials or inverted backoff bounds.
    pub fn validate(&self) -> ShareResult<()> {
        if self.account_name.trim().is_empty() {
            return Err(ShareError::config("account name must not be empty"));
        }
        if self.password.is_empty() {
            return Err(ShareError::config("password must not be empty"));
        }
        if self.min_backoff > self.max_backoff {
            return Err(ShareError::config(format!(
                "min backoff ({:?}) exceeds max backoff ({:?})",
                self.min_backoff, self.max_backoff
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for ShareConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShareConfig")
            .field("account_name", &self.account_name)
            .field("password", &REDACTED)
            .field("application_id", &self.application_id)
            .field("region", &self.region)
            .field("base_url", &self.base_url())
            .field("wait_time", &self.wait_time)
            .field("min_backoff", &self.min_backoff)
            .field("max_backoff", &self.max_backoff)
            .field("retry_jitter", &self.retry_jitter)
            .field("login_retries", &self.login_retries)
            .field("poll_retries", &self.poll_retries)
            .finish_non_exhaustive()
    }
}

/// Parse an environment variable, treating absent or malformed values as unset
fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ShareConfig::new("alice", "hunter2");
        assert_eq!(config.wait_time, Duration::from_secs(310));
        assert_eq!(config.min_backoff, Duration::from_secs(5));
        assert_eq!(config.max_backoff, Duration::from_secs(300));
        assert_eq!(config.login_retries, 10);
        assert_eq!(config.poll_retries, 1000);
        assert!((config.poll_policy().jitter - timing::RETRY_JITTER).abs() < f64::EPSILON);
        assert!((config.login_policy().jitter - timing::RETRY_JITTER).abs() < f64::EPSILON);
        assert_eq!(config.base_url(), service::BASE_URL_US);
        assert_eq!(config.credentials().application_id, service::APPLICATION_ID);
    }

    #[test]
    fn test_region_and_override() {
        let config = ShareConfig::new("alice", "hunter2").with_region(Region::OutsideUs);
        assert_eq!(config.base_url(), service::BASE_URL_OUTSIDE_US);

        let config = config.with_base_url("http://127.0.0.1:9000/");
        assert_eq!(config.base_url(), "http://127.0.0.1:9000");
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = ShareConfig::new("alice", "hunter2");
        let rendered = format!("{config:?} {:?}", config.credentials());
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains(REDACTED));
    }

    #[test]
    fn test_validate() {
        assert!(ShareConfig::new("alice", "hunter2").validate().is_ok());
        assert!(ShareConfig::new(" ", "hunter2").validate().is_err());
        assert!(ShareConfig::new("alice", "").validate().is_err());
        assert!(ShareConfig::new("alice", "hunter2")
            .with_backoff(Duration::from_secs(10), Duration::from_secs(1))
            .validate()
            .is_err());
    }

    #[test]
    fn test_retry_jitter_is_clamped() {
        let config = ShareConfig::new("alice", "hunter2").with_retry_jitter(3.0);
        assert!((config.poll_policy().jitter - 1.0).abs() < f64::EPSILON);

        let config = config.with_retry_jitter(f64::NAN);
        assert!(config.poll_policy().jitter.abs() < f64::EPSILON);
    }
}
