// ABOUTME: Converts the Share service's structured login failure payload into a typed error
// ABOUTME: Extracts the SSO key and the error list embedded in the fault message
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Login failures come back as a JSON object whose `Message` may embed
//! `Key='SSO_AuthenticatePasswordInvalid'` and
//! `Content='{"errors":["AccountPasswordInvalid"]}'` segments. The key becomes
//! the error code and the error list becomes a readable sentence.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::errors::ShareError;

/// Code used when the payload names none
const FALLBACK_CODE: &str = "AuthorizeError";

/// Prefix the service puts on every key
const SSO_PREFIX: &str = "SSO_";

static SEGMENT_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    // Matches: Key='SSO_AuthenticateAccountNotFound'
    Regex::new(r"(\S+?)='(.*?)'").ok()
});

static CAMEL_BOUNDARY: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"([a-z])([A-Z])").ok());

#[derive(Debug, Deserialize)]
struct FaultBody {
    #[serde(rename = "Code")]
    code: Option<String>,
    #[serde(rename = "Message")]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FaultContent {
    #[serde(default)]
    errors: Vec<String>,
}

/// Build an `AuthRejected` error from a login failure body
#[must_use]
pub fn parse_auth_error(body: &Value) -> ShareError {
    let fault = FaultBody::deserialize(body).unwrap_or(FaultBody {
        code: None,
        message: body.as_str().map(str::to_owned),
    });

    let raw_message = fault.message.unwrap_or_default();
    let mut code = fault.code.map(|c| strip_sso(&c));
    let mut message = None;

    if let Some(pattern) = SEGMENT_PATTERN.as_ref() {
        for caps in pattern.captures_iter(&raw_message) {
            match (&caps[1], &caps[2]) {
                ("Key", key) => code = Some(strip_sso(key)),
                ("Content", content) => {
                    if let Ok(parsed) = serde_json::from_str::<FaultContent>(content) {
                        if !parsed.errors.is_empty() {
                            message = Some(humanize(&parsed.errors.join(" ")));
                        }
                    }
                }
                _ => {}
            }
        }
    }

    let message = message.unwrap_or_else(|| {
        if raw_message.is_empty() {
            "Authentication rejected.".to_owned()
        } else {
            raw_message
        }
    });

    ShareError::auth_rejected(
        code.filter(|c| !c.is_empty())
            .unwrap_or_else(|| FALLBACK_CODE.to_owned()),
        message,
    )
}

fn strip_sso(key: &str) -> String {
    key.replacen(SSO_PREFIX, "", 1)
}

/// `AccountPasswordInvalid` becomes `Account password invalid.`
fn humanize(errors: &str) -> String {
    let mut sentence = CAMEL_BOUNDARY.as_ref().map_or_else(
        || errors.to_owned(),
        |re| {
            re.replace_all(errors, |caps: &regex::Captures<'_>| {
                format!("{} {}", &caps[1], caps[2].to_lowercase())
            })
            .into_owned()
        },
    );
    if !sentence.ends_with('.') {
        sentence.push('.');
    }
    sentence
}
