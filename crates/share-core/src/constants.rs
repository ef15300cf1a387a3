// ABOUTME: Default endpoints, identifiers, and timing values for the Share service
// ABOUTME: Injected into ShareConfig at construction; never mutated at runtime
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Service endpoints and client identity
pub mod service {
    /// Base URL for accounts registered in the United States
    pub const BASE_URL_US: &str = "https://share2.dexcom.com/ShareWebServices/Services";

    /// Base URL for accounts registered outside the United States
    pub const BASE_URL_OUTSIDE_US: &str = "https://shareous1.dexcom.com/ShareWebServices/Services";

    /// Login path, relative to the base URL
    pub const LOGIN_PATH: &str = "/General/LoginPublisherAccountByName";

    /// Latest-readings path, relative to the base URL
    pub const LATEST_GLUCOSE_PATH: &str = "/Publisher/ReadPublisherLatestGlucoseValues";

    /// Application id of the official Share mobile client
    pub const APPLICATION_ID: &str = "d89443d2-327c-4a6f-89e5-496bbb0317db";

    /// User agent of the official Share mobile client
    pub const USER_AGENT: &str = "Dexcom Share/3.0.2.11 CFNetwork/711.2.23 Darwin/14.0.0";

    /// Accept / Content-Type value for every request
    pub const JSON_CONTENT_TYPE: &str = "application/json";
}

/// Read window defaults
pub mod fetch {
    /// History window requested when the caller gives none (one day)
    pub const DEFAULT_MINUTES: u32 = 1440;

    /// Reading count requested when the caller gives none
    pub const DEFAULT_MAX_COUNT: u32 = 1000;

    /// Largest window the service accepts
    pub const MAX_MINUTES: u32 = 1440;

    /// Milliseconds per minute, used to size the adaptive window
    pub const MS_PER_MINUTE: i64 = 60_000;
}

/// Polling cadence and retry bounds
pub mod timing {
    /// Transmitter sampling cadence in seconds
    pub const CADENCE_SECS: u64 = 5 * 60;

    /// Upload latency allowance added to the cadence, in seconds
    pub const UPLOAD_MARGIN_SECS: u64 = 10;

    /// Smallest delay between poll retries, in milliseconds
    pub const MIN_BACKOFF_MS: u64 = 5_000;

    /// Largest delay between poll retries, in milliseconds
    pub const MAX_BACKOFF_MS: u64 = 5 * 60 * 1000;

    /// Login attempts before giving up
    pub const LOGIN_RETRIES: u32 = 10;

    /// Poll attempts before the stream gives up waiting for a new reading
    pub const POLL_RETRIES: u32 = 1000;

    /// Smallest delay between login retries, in milliseconds
    pub const LOGIN_MIN_BACKOFF_MS: u64 = 1_000;

    /// Backoff growth factor between consecutive attempts
    pub const BACKOFF_FACTOR: f64 = 2.0;

    /// Random stretch applied to each retry delay, as a fraction of the delay
    pub const RETRY_JITTER: f64 = 0.1;

    /// Default HTTP request timeout in seconds
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;

    /// Default HTTP connect timeout in seconds
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;
}

/// Environment variable names read by `ShareConfig::from_env`
pub mod env_config {
    /// Account name
    pub const USERNAME: &str = "DEXCOM_SHARE_USERNAME";
    /// Account password
    pub const PASSWORD: &str = "DEXCOM_SHARE_PASSWORD";
    /// Application id override
    pub const APPLICATION_ID: &str = "DEXCOM_SHARE_APPLICATION_ID";
    /// `true`/`1` selects the international endpoint
    pub const OUTSIDE_US: &str = "DEXCOM_SHARE_OUTSIDE_US";
    /// Explicit base URL override
    pub const BASE_URL: &str = "DEXCOM_SHARE_BASE_URL";
    /// Cadence plus margin, in seconds
    pub const WAIT_SECS: &str = "DEXCOM_SHARE_WAIT_SECS";
    /// Minimum poll backoff, in milliseconds
    pub const MIN_BACKOFF_MS: &str = "DEXCOM_SHARE_MIN_BACKOFF_MS";
    /// Maximum poll backoff, in milliseconds
    pub const MAX_BACKOFF_MS: &str = "DEXCOM_SHARE_MAX_BACKOFF_MS";
    /// Retry jitter fraction (0.0 disables)
    pub const RETRY_JITTER: &str = "DEXCOM_SHARE_RETRY_JITTER";
}
