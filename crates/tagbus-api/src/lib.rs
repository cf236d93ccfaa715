// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # tagbus-api
//!
//! HTTP/WebSocket surface for the tagbus gateway.
//!
//! A thin axum layer over the gateway contracts: every endpoint answers
//! with the same `{success, message, data, error}` envelope, and errors
//! carry the HTTP status the underlying gateway error maps to.
//!
//! Routes cover machine/tag configuration, symbolic tag reads/writes,
//! direct register access, bulk configuration import/export, auto-control,
//! and a WebSocket monitor streaming selected tag values.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod handlers;
pub mod response;
pub mod server;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use response::{ApiResponse, ErrorBody};
pub use server::{ApiConfig, ApiServer};
pub use state::AppState;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
