// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Mock Modbus transport.
//!
//! [`MockBank`] is a shared register bank that all transports created by
//! [`mock_manager`] operate on, so tests can seed device state, inject
//! failures, and verify issued writes without a network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use tagbus_core::error::{ModbusError, ModbusResult};
use tagbus_modbus::{ConnectionManager, ModbusTransport, TransportState};

// =============================================================================
// MockBank
// =============================================================================

/// Shared register state and interaction counters for mock transports.
#[derive(Default)]
pub struct MockBank {
    registers: Mutex<HashMap<u16, u16>>,
    fail_next_read: AtomicBool,
    fail_next_write: AtomicBool,
    fail_connects: AtomicBool,
    read_count: AtomicU64,
    write_count: AtomicU64,
    write_history: Mutex<Vec<(u16, u16)>>,
}

impl MockBank {
    /// Creates an empty bank.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Seeds a register with a value.
    pub fn set_register(&self, address: u16, value: u16) {
        self.registers.lock().insert(address, value);
    }

    /// Returns a register's current value (0 when never written).
    pub fn register(&self, address: u16) -> u16 {
        self.registers.lock().get(&address).copied().unwrap_or(0)
    }

    /// Makes the next read fail with a protocol error.
    pub fn fail_next_read(&self) {
        self.fail_next_read.store(true, Ordering::SeqCst);
    }

    /// Makes the next write fail with a protocol error.
    pub fn fail_next_write(&self) {
        self.fail_next_write.store(true, Ordering::SeqCst);
    }

    /// Makes every connect attempt fail while set.
    pub fn fail_connects(&self, fail: bool) {
        self.fail_connects.store(fail, Ordering::SeqCst);
    }

    /// Number of read operations issued.
    pub fn read_count(&self) -> u64 {
        self.read_count.load(Ordering::SeqCst)
    }

    /// Number of write operations issued.
    pub fn write_count(&self) -> u64 {
        self.write_count.load(Ordering::SeqCst)
    }

    /// Every `(address, value)` write issued, in order.
    pub fn write_history(&self) -> Vec<(u16, u16)> {
        self.write_history.lock().clone()
    }
}

// =============================================================================
// MockTransport
// =============================================================================

/// A transport backed by a shared [`MockBank`].
pub struct MockTransport {
    bank: Arc<MockBank>,
    connected: bool,
}

impl MockTransport {
    /// Creates a transport over the given bank.
    pub fn new(bank: Arc<MockBank>) -> Self {
        Self {
            bank,
            connected: false,
        }
    }
}

#[async_trait]
impl ModbusTransport for MockTransport {
    async fn connect(&mut self) -> ModbusResult<()> {
        if self.bank.fail_connects.load(Ordering::SeqCst) {
            return Err(ModbusError::connection_failed(
                "mock",
                502,
                "injected connect failure",
            ));
        }
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> ModbusResult<()> {
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn state(&self) -> TransportState {
        if self.connected {
            TransportState::Connected
        } else {
            TransportState::Disconnected
        }
    }

    async fn read_holding_registers(
        &mut self,
        _unit_id: u8,
        address: u16,
        count: u16,
    ) -> ModbusResult<Vec<u16>> {
        self.bank.read_count.fetch_add(1, Ordering::SeqCst);

        if self.bank.fail_next_read.swap(false, Ordering::SeqCst) {
            return Err(ModbusError::read_failed(
                address.to_string(),
                "injected read failure",
            ));
        }

        let registers = self.bank.registers.lock();
        Ok((address..address.saturating_add(count))
            .map(|a| registers.get(&a).copied().unwrap_or(0))
            .collect())
    }

    async fn write_single_register(
        &mut self,
        _unit_id: u8,
        address: u16,
        value: u16,
    ) -> ModbusResult<()> {
        self.bank.write_count.fetch_add(1, Ordering::SeqCst);

        if self.bank.fail_next_write.swap(false, Ordering::SeqCst) {
            return Err(ModbusError::write_failed(
                address.to_string(),
                "injected write failure",
            ));
        }

        self.bank.registers.lock().insert(address, value);
        self.bank.write_history.lock().push((address, value));
        Ok(())
    }

    fn display_name(&self) -> String {
        "mock transport".to_string()
    }
}

/// Creates a connection manager whose transports all share `bank`.
pub fn mock_manager(bank: Arc<MockBank>) -> ConnectionManager {
    ConnectionManager::with_factory(Arc::new(move |_| {
        Box::new(MockTransport::new(bank.clone())) as Box<dyn ModbusTransport>
    }))
}
