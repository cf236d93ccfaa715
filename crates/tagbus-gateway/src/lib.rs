// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # tagbus-gateway
//!
//! The tag resolution and register/bit transcoding engine.
//!
//! This crate ties the directory, the connection manager, and the register
//! codec together:
//!
//! - [`TagGateway`]: symbolic tag reads/writes, wildcard toggles, and
//!   concurrent bulk reads with per-tag failure isolation
//! - [`AutoControl`]: stored control plans executed as
//!   compare-then-write passes, journaled per day
//!
//! ## Example
//!
//! ```rust,ignore
//! use tagbus_gateway::TagGateway;
//!
//! let gateway = TagGateway::new(directory, connections);
//! let value = gateway.read_tag("OIL_MAIN", "PV").await?;
//! gateway.write_tag("OIL_MAIN", "MODE", "MANUAL").await?;
//! gateway.write_tag("OIL_MAIN", "MODE", "*").await?; // toggle
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod autocontrol;
pub mod resolver;

pub use autocontrol::{
    AutoControl, ControlPlan, ControlState, ControlTarget, ExecutionSummary, MachineControl,
};
pub use resolver::{TagGateway, TagReading};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
