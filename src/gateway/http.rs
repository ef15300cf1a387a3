// ABOUTME: reqwest implementation of the Share gateway for login and latest-glucose reads
// ABOUTME: Maps HTTP status, transport, and decoding failures onto ShareError variants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::auth_error::parse_auth_error;
use super::{SessionId, ShareGateway};
use crate::config::{AccountCredentials, ShareConfig};
use crate::constants::service;
use crate::errors::{ShareError, ShareResult};
use crate::http_client::build_client;
use crate::models::RawReading;

/// Login request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    account_name: &'a str,
    password: &'a str,
    application_id: &'a str,
}

/// Query string of the latest-glucose endpoint
#[derive(Debug, Serialize)]
struct LatestGlucoseQuery<'a> {
    #[serde(rename = "sessionID")]
    session_id: &'a str,
    minutes: u32,
    #[serde(rename = "maxCount")]
    max_count: u32,
}

/// Gateway talking to the real Share web services
#[derive(Debug, Clone)]
pub struct HttpShareGateway {
    client: Client,
    base_url: String,
}

impl HttpShareGateway {
    /// Create a gateway for the configured region or base URL
    ///
    /// # Errors
    ///
    /// Returns `ShareError::Config` if the HTTP client cannot be built.
    pub fn new(config: &ShareConfig) -> ShareResult<Self> {
        Ok(Self {
            client: build_client(config)?,
            base_url: config.base_url().to_owned(),
        })
    }

    /// Create a gateway around an existing client
    #[must_use]
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

fn transport_error(err: &reqwest::Error) -> ShareError {
    ShareError::Network(err.to_string())
}

#[async_trait]
impl ShareGateway for HttpShareGateway {
    async fn authenticate(&self, credentials: &AccountCredentials) -> ShareResult<SessionId> {
        let url = self.url(service::LOGIN_PATH);
        debug!(url = %url, account = %credentials.account_name, "POST login");

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, service::JSON_CONTENT_TYPE)
            .header(ACCEPT, service::JSON_CONTENT_TYPE)
            .json(&LoginRequest {
                account_name: &credentials.account_name,
                password: &credentials.password,
                application_id: &credentials.application_id,
            })
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| transport_error(&e))?;

        if !status.is_success() {
            // A JSON fault is a deliberate rejection; anything else is treated as transport trouble
            return Err(match serde_json::from_str::<Value>(&body) {
                Ok(fault) => {
                    let err = parse_auth_error(&fault);
                    warn!(status = status.as_u16(), error = %err, "Share login rejected");
                    err
                }
                Err(_) => ShareError::Http {
                    status: status.as_u16(),
                    context: "login",
                },
            });
        }

        let token: String = serde_json::from_str(&body)?;
        info!(account = %credentials.account_name, "Share login succeeded");
        Ok(SessionId::new(token))
    }

    async fn fetch_latest(
        &self,
        session: &SessionId,
        minutes: u32,
        max_count: u32,
    ) -> ShareResult<Vec<RawReading>> {
        let url = self.url(service::LATEST_GLUCOSE_PATH);
        debug!(url = %url, minutes, max_count, "POST latest glucose");

        let response = self
            .client
            .post(&url)
            .query(&LatestGlucoseQuery {
                session_id: session.as_str(),
                minutes,
                max_count,
            })
            .header(ACCEPT, service::JSON_CONTENT_TYPE)
            .header(CONTENT_LENGTH, 0)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ShareError::Http {
                status: status.as_u16(),
                context: "read latest glucose",
            });
        }

        let body = response.text().await.map_err(|e| transport_error(&e))?;
        let readings: Vec<RawReading> = serde_json::from_str(&body)?;
        debug!(count = readings.len(), "received raw readings");
        Ok(readings)
    }
}
