// ABOUTME: Main library entry point for the Dexcom Share glucose polling client
// ABOUTME: Exposes session handling, reading fetch, and the paced reading stream
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Dexcom Share client
//!
//! Polls the Dexcom Share web service for continuous glucose monitor readings
//! and exposes them as an ordered, de-duplicated async stream.
//!
//! ## Architecture
//!
//! - **Gateway**: the two remote operations (login, read latest) behind a trait
//! - **Session**: lazily obtained session id, coalesced logins, lazy invalidation
//! - **Retry**: bounded retries with capped exponential backoff
//! - **Schedule**: sleeps until the next five-minute upload is expected
//! - **Stream**: the wait/fetch/emit loop plus one-shot `read`, `wait`, `reset`
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use dexcom_share::{ReadOptions, ShareClient, ShareConfig};
//!
//! #[tokio::main]
//! async fn main() -> dexcom_share::ShareResult<()> {
//!     let client = ShareClient::new(ShareConfig::new("account", "password"))?;
//!     for reading in client.read(ReadOptions::last_minutes(60)).await? {
//!         println!("{reading}");
//!     }
//!     Ok(())
//! }
//! ```

pub use share_core::{constants, errors, models};

/// Client configuration and account credentials
pub mod config;

/// One-shot reads and batch normalization
pub mod fetch;

/// Remote service gateway trait and HTTP implementation
pub mod gateway;

/// Shared HTTP client construction
pub mod http_client;

/// Structured logging setup
pub mod logging;

/// Bounded retry with capped exponential backoff
pub mod retry;

/// Cadence-based wait computation and clocks
pub mod schedule;

/// Session credential lifecycle
pub mod session;

/// Paced reading stream
pub mod stream;

pub use config::{AccountCredentials, Region, ShareConfig};
pub use errors::{ShareError, ShareResult};
pub use fetch::ReadOptions;
pub use gateway::{HttpShareGateway, SessionId, ShareGateway};
pub use models::{RawReading, Reading, Trend};
pub use retry::{with_retry, RetryError, RetryPolicy};
pub use schedule::{Clock, SystemClock, WaitPolicy};
pub use session::{CredentialStatus, SessionManager};
pub use stream::{ReadingStream, ShareClient};
