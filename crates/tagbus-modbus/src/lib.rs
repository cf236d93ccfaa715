// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # tagbus-modbus
//!
//! Modbus TCP transport and per-endpoint connection management for the
//! tagbus gateway.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 MachineClient                   │
//! │     (analog word / digital bit operations)      │
//! └─────────────────────────────────────────────────┘
//!                        │
//!                        ▼
//! ┌─────────────────────────────────────────────────┐
//! │         ConnectionManager / Connection          │
//! │  (one live connection per (host, port) key)     │
//! └─────────────────────────────────────────────────┘
//!                        │
//!                        ▼
//! ┌─────────────────────────────────────────────────┐
//! │            ModbusTransport (trait)              │
//! │        TcpTransport via tokio-modbus            │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use tagbus_modbus::{ConnectConfig, ConnectionManager, MachineClient};
//!
//! let manager = ConnectionManager::new(ConnectConfig::default());
//! let client = MachineClient::new(manager.get("172.30.1.97", 502), 1);
//!
//! let word = client.read_register(2005).await?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod machine;
pub mod manager;
pub mod tcp;
pub mod transport;

pub use machine::MachineClient;
pub use manager::{Connection, ConnectionManager, Endpoint, TransportFactory};
pub use tcp::{ConnectConfig, TcpTransport};
pub use transport::{ModbusTransport, TransportState};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
