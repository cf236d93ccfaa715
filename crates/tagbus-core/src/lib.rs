// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # tagbus-core
//!
//! Core types and transforms for the tagbus Modbus/TCP tag gateway.
//!
//! This crate provides the vocabulary shared by every tagbus component:
//!
//! - **Types**: `MachineName`, `TagName`, `TagType`, `Permission`, `Mode`,
//!   `ModeKind`, `TagValue`
//! - **Codec**: pure bit/mode transforms (`extract_bit`, `set_bit`,
//!   `decode_mode`, `encode_mode`, `toggle`)
//! - **Address**: physical register address parsing and range validation
//! - **Schema**: `TagConfig` / `MachineConfig` with admission-time
//!   validation
//! - **Error**: unified error hierarchy with HTTP status mapping
//! - **Journal**: append-only, day-keyed control action journal
//!
//! ## Example
//!
//! ```rust
//! use tagbus_core::codec::{decode_mode, extract_bit, set_bit};
//! use tagbus_core::types::{Mode, ModeKind};
//!
//! let word = set_bit(0, 3, true);
//! assert_eq!(word, 0b1000);
//! let mode = decode_mode(extract_bit(word, 3), ModeKind::AutoManual);
//! assert_eq!(mode, Mode::Manual);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod address;
pub mod codec;
pub mod error;
pub mod journal;
pub mod schema;
pub mod types;

pub use address::RegisterAddress;
pub use error::{
    ConfigError, ConfigResult, ControlError, ControlResult, GatewayError, GatewayResult,
    ModbusError, ModbusResult, StoreError, StoreResult,
};
pub use journal::{ControlJournal, ControlRecord, ControlStatus};
pub use schema::{MachineConfig, TagConfig, DEFAULT_MODBUS_PORT, DEFAULT_UNIT_ID};
pub use types::{MachineName, Mode, ModeKind, Permission, TagName, TagType, TagValue};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
