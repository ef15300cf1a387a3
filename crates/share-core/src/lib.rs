// ABOUTME: Core types and constants for the Dexcom Share client
// ABOUTME: Foundation crate with error handling, reading models, and service defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Share Core
//!
//! Foundation crate providing shared types and constants for the Dexcom Share
//! client. Nothing in here performs I/O, so it changes infrequently and keeps
//! incremental builds of the workspace cheap.
//!
//! ## Modules
//!
//! - **errors**: `ShareError` taxonomy with retry classification
//! - **constants**: Service endpoints, application id, and timing defaults
//! - **models**: Glucose `Reading`, `Trend`, and the raw wire record

/// Unified error type for gateway, session, and polling failures
pub mod errors;

/// Service defaults organized by concern
pub mod constants;

/// Glucose reading models
pub mod models;
