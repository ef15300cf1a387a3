// ABOUTME: Structured error types for Dexcom Share gateway and polling operations
// ABOUTME: Classifies failures into permanent rejections and retryable conditions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use thiserror::Error;

/// Errors raised while talking to the Share service or driving the poll loop
///
/// The type is `Clone` so that a single login outcome can be handed to every
/// caller waiting on the same in-flight authentication. Transport errors are
/// therefore captured as messages rather than wrapped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShareError {
    /// The service explicitly rejected the account (bad password, locked, unknown)
    #[error("{code}: {message}")]
    AuthRejected {
        /// Machine-readable key, e.g. `AuthenticatePasswordInvalid`
        code: String,
        /// Human-readable explanation
        message: String,
    },

    /// Non-success HTTP status not attributable to an account rejection
    #[error("{context} failed with HTTP {status}")]
    Http {
        /// Response status code
        status: u16,
        /// Which request failed
        context: &'static str,
    },

    /// Connection, TLS, or timeout failure
    #[error("Network error: {0}")]
    Network(String),

    /// Response body could not be decoded
    #[error("Malformed response: {0}")]
    Parse(String),

    /// The service answered but had nothing newer than the last delivered reading
    #[error("No new readings yet")]
    NoNewData,

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ShareError {
    /// Create an account rejection
    #[must_use]
    pub fn auth_rejected(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AuthRejected {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether retrying the same operation could succeed
    ///
    /// Rejections and configuration problems will fail identically on every
    /// attempt, so retry loops abort on them instead of burning their budget.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        !matches!(self, Self::AuthRejected { .. } | Self::Config(_))
    }

    /// HTTP status carried by this error, if any
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ShareError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Result alias used across the workspace
pub type ShareResult<T> = Result<T, ShareError>;
