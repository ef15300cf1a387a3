// ABOUTME: Configuration module for account credentials, region, and polling parameters
// ABOUTME: Explicit per-instance configuration with documented defaults and env loading
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
//! Configuration for the Share client
//!
//! - **Share**: Account credentials, region selection, cadence and backoff bounds
//!
//! Every value has a documented default taken from `share_core::constants`. The
//! configuration is owned by a single client instance; nothing is global, so two
//! clients pointed at different regions never interfere.

/// Share account, endpoint, and timing configuration
pub mod share;

pub use share::{AccountCredentials, Region, ShareConfig};
