// ABOUTME: HTTP client construction with connection pooling for Share API calls
// ABOUTME: Per-instance client carrying the configured timeouts and user agent
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use reqwest::{Client, ClientBuilder};

use crate::config::ShareConfig;
use crate::errors::{ShareError, ShareResult};

/// Build the pooled HTTP client used by one gateway
///
/// Each client instance owns its own pool so that two clients configured with
/// different timeouts or user agents never share settings.
///
/// # Errors
///
/// Returns `ShareError::Config` if the TLS backend cannot be initialized.
pub fn build_client(config: &ShareConfig) -> ShareResult<Client> {
    ClientBuilder::new()
        .user_agent(config.user_agent.as_str())
        .timeout(config.request_timeout)
        .connect_timeout(config.connect_timeout)
        .build()
        .map_err(|e| ShareError::config(format!("failed to build HTTP client: {e}")))
}
