// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Per-machine register operations.
//!
//! [`MachineClient`] binds a shared endpoint connection to one machine's
//! unit id and exposes the two operation families the gateway performs:
//!
//! - **Analog**: read or write a whole 16-bit holding register.
//! - **Digital**: read or write a single bit within a register. A bit
//!   write is a read-modify-write of the whole word so the other 15 bits
//!   are preserved.
//!
//! The read-then-write inside [`MachineClient::write_bit`] takes no lock
//! against other writers of the same register; concurrent togglers of one
//! bit can race. This mirrors the device-side reality that FC 06 has no
//! compare-and-swap.

use std::sync::Arc;

use tagbus_core::codec::{decode_mode, extract_bit, set_bit};
use tagbus_core::error::ModbusResult;
use tagbus_core::types::{Mode, ModeKind};

use super::manager::Connection;

// =============================================================================
// MachineClient
// =============================================================================

/// Register operations against one machine.
#[derive(Clone)]
pub struct MachineClient {
    connection: Arc<Connection>,
    unit_id: u8,
}

impl MachineClient {
    /// Binds a connection to a machine's unit id.
    pub fn new(connection: Arc<Connection>, unit_id: u8) -> Self {
        Self {
            connection,
            unit_id,
        }
    }

    /// Returns the unit id used for operations.
    pub fn unit_id(&self) -> u8 {
        self.unit_id
    }

    // =========================================================================
    // Analog Operations
    // =========================================================================

    /// Reads a holding register.
    pub async fn read_register(&self, address: u16) -> ModbusResult<u16> {
        self.connection
            .read_holding_register(self.unit_id, address)
            .await
    }

    /// Writes a holding register, returning the value written.
    pub async fn write_register(&self, address: u16, value: u16) -> ModbusResult<u16> {
        self.connection
            .write_register(self.unit_id, address, value)
            .await?;
        Ok(value)
    }

    // =========================================================================
    // Digital Operations
    // =========================================================================

    /// Reads one bit of a holding register and decodes it under `kind`.
    pub async fn read_bit(&self, address: u16, bit: u8, kind: ModeKind) -> ModbusResult<Mode> {
        let word = self
            .connection
            .read_holding_register(self.unit_id, address)
            .await?;
        Ok(decode_mode(extract_bit(word, bit), kind))
    }

    /// Sets or clears one bit of a holding register and decodes the
    /// written state under `kind`.
    ///
    /// Reads the current word, modifies the single bit, writes the whole
    /// word back.
    pub async fn write_bit(
        &self,
        address: u16,
        bit: u8,
        state: bool,
        kind: ModeKind,
    ) -> ModbusResult<Mode> {
        let word = self
            .connection
            .read_holding_register(self.unit_id, address)
            .await?;

        let modified = set_bit(word, bit, state);
        self.connection
            .write_register(self.unit_id, address, modified)
            .await?;

        Ok(decode_mode(extract_bit(modified, bit), kind))
    }
}

impl std::fmt::Debug for MachineClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MachineClient")
            .field("endpoint", self.connection.endpoint())
            .field("unit_id", &self.unit_id)
            .finish()
    }
}
