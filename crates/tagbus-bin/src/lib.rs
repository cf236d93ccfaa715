// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # tagbus-bin
//!
//! CLI binary for the tagbus Modbus/TCP tag gateway.
//!
//! This crate provides the `tagbus` binary entry point:
//!
//! - CLI argument parsing with clap (`run`, `validate`, `version`)
//! - YAML application configuration with environment overrides
//! - Logging initialization (text/json/compact via tracing)
//! - Runtime assembly of store, directory, connection manager, gateway,
//!   auto-control, and API server
//! - Graceful shutdown closing every Modbus connection and the store pool

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod shutdown;

pub use cli::{Cli, Commands};
pub use config::{load_config, load_or_default, AppConfig};
pub use error::{BinError, BinResult};
pub use logging::init_logging;
pub use runtime::{GatewayRuntime, RuntimeBuilder};
pub use shutdown::{ShutdownCoordinator, ShutdownSignal};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
