// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Abstract transport layer for Modbus communication.
//!
//! The [`ModbusTransport`] trait covers exactly the primitives the gateway
//! performs against devices: holding-register reads and single-register
//! writes. The unit id (slave address) is supplied per operation, because
//! connections are shared per `(host, port)` endpoint while machines behind
//! one endpoint may answer on different unit ids.

use async_trait::async_trait;
use std::fmt;

use tagbus_core::error::ModbusResult;

// =============================================================================
// TransportState
// =============================================================================

/// Connection state of a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransportState {
    /// Transport is disconnected.
    #[default]
    Disconnected,
    /// Transport is connecting.
    Connecting,
    /// Transport is connected and ready.
    Connected,
}

impl TransportState {
    /// Returns `true` if the transport is connected.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        };
        f.write_str(s)
    }
}

// =============================================================================
// ModbusTransport Trait
// =============================================================================

/// Abstract transport for the register operations the gateway uses.
///
/// # Implementors
///
/// - [`TcpTransport`](super::tcp::TcpTransport): Modbus TCP over
///   tokio-modbus
/// - Mock transports in the test crates
///
/// Operations take `&mut self`; concurrent callers share a transport
/// through the connection manager, which serializes access.
#[async_trait]
pub trait ModbusTransport: Send + Sync {
    /// Establishes a connection to the device.
    ///
    /// Connecting is an observable network action (TCP handshake). The
    /// implementation applies its own timeout and retry budget per attempt.
    async fn connect(&mut self) -> ModbusResult<()>;

    /// Gracefully closes the connection. Safe to call when already closed.
    async fn disconnect(&mut self) -> ModbusResult<()>;

    /// Returns `true` if the transport is connected.
    fn is_connected(&self) -> bool;

    /// Returns the current transport state.
    fn state(&self) -> TransportState;

    /// Reads holding registers (FC 03).
    ///
    /// # Arguments
    ///
    /// * `unit_id` - Modbus unit id (slave address) for this operation
    /// * `address` - Starting register address (0-based)
    /// * `count` - Number of registers to read
    async fn read_holding_registers(
        &mut self,
        unit_id: u8,
        address: u16,
        count: u16,
    ) -> ModbusResult<Vec<u16>>;

    /// Writes a single holding register (FC 06).
    ///
    /// # Arguments
    ///
    /// * `unit_id` - Modbus unit id (slave address) for this operation
    /// * `address` - Register address (0-based)
    /// * `value` - Value to write
    async fn write_single_register(
        &mut self,
        unit_id: u8,
        address: u16,
        value: u16,
    ) -> ModbusResult<()>;

    /// Returns a display name for this transport.
    fn display_name(&self) -> String;
}

// =============================================================================
// Tests
// =============================================================================
