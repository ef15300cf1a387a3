// ABOUTME: Remote Service Gateway abstraction for the Share login and read endpoints
// ABOUTME: Trait seam consumed by the session and fetch layers, with an HTTP implementation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Remote Service Gateway
//!
//! The gateway performs exactly two remote operations and nothing else:
//!
//! - **authenticate**: exchange account credentials for a session id
//! - **fetch latest**: read up to `max_count` raw readings from the last `minutes`
//!
//! Both raise a typed [`ShareError`](crate::errors::ShareError) on failure. The
//! gateway holds no session state; ownership of the session id belongs to the
//! [`SessionManager`](crate::session::SessionManager).
//!
//! Tests substitute their own `ShareGateway` to script outcomes without a network.

use std::fmt;

use async_trait::async_trait;

use crate::config::AccountCredentials;
use crate::errors::ShareResult;
use crate::models::RawReading;

/// Parsing of structured login rejections
pub mod auth_error;
/// reqwest-backed gateway
pub mod http;

pub use http::HttpShareGateway;

/// Opaque session token returned by a successful login
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Wrap a raw session token
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token, for building requests
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionId([REDACTED])")
    }
}

/// The two remote operations of the Share service
#[async_trait]
pub trait ShareGateway: Send + Sync {
    /// Log in and obtain a session id
    ///
    /// # Errors
    ///
    /// Returns `ShareError::AuthRejected` when the service refuses the account,
    /// or a retryable error for transport and decoding failures.
    async fn authenticate(&self, credentials: &AccountCredentials) -> ShareResult<SessionId>;

    /// Read the latest raw readings for a session
    ///
    /// # Errors
    ///
    /// Returns `ShareError::Http` for non-success responses (including an
    /// expired session), `ShareError::Network` or `ShareError::Parse` otherwise.
    async fn fetch_latest(
        &self,
        session: &SessionId,
        minutes: u32,
        max_count: u32,
    ) -> ShareResult<Vec<RawReading>>;
}
