// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Per-endpoint connection lifecycle management.
//!
//! The [`ConnectionManager`] keeps at most one reusable [`Connection`] per
//! `(host, port)` endpoint. Connections are created lazily on first use,
//! reconnected lazily after a detected failure, and closed in bulk at
//! process shutdown.
//!
//! A connection that errors mid-operation is invalidated (disconnected) so
//! the next caller reconnects instead of reusing a socket in an undefined
//! state.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use tagbus_core::error::{ModbusError, ModbusResult};

use super::tcp::{ConnectConfig, TcpTransport};
use super::transport::ModbusTransport;

// =============================================================================
// Endpoint
// =============================================================================

/// A `(host, port)` connection key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    /// Host address.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl Endpoint {
    /// Creates an endpoint key.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

// =============================================================================
// Connection
// =============================================================================

/// A logical connection to one endpoint.
///
/// Wraps a transport behind an async mutex; all register operations ensure
/// the transport is connected before use and invalidate it on failure.
pub struct Connection {
    endpoint: Endpoint,
    transport: Mutex<Box<dyn ModbusTransport>>,
}

impl Connection {
    fn new(endpoint: Endpoint, transport: Box<dyn ModbusTransport>) -> Self {
        Self {
            endpoint,
            transport: Mutex::new(transport),
        }
    }

    /// Returns the endpoint this connection serves.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Reads a single holding register.
    pub async fn read_holding_register(&self, unit_id: u8, address: u16) -> ModbusResult<u16> {
        let mut transport = self.transport.lock().await;
        if !transport.is_connected() {
            transport.connect().await?;
        }

        match transport.read_holding_registers(unit_id, address, 1).await {
            Ok(words) => words
                .first()
                .copied()
                .ok_or_else(|| ModbusError::invalid_response("empty register response")),
            Err(e) => {
                tracing::warn!(
                    endpoint = %self.endpoint,
                    error = %e,
                    "Modbus operation failed; invalidating connection"
                );
                let _ = transport.disconnect().await;
                Err(e)
            }
        }
    }

    /// Writes a single holding register.
    pub async fn write_register(&self, unit_id: u8, address: u16, value: u16) -> ModbusResult<()> {
        let mut transport = self.transport.lock().await;
        if !transport.is_connected() {
            transport.connect().await?;
        }

        match transport.write_single_register(unit_id, address, value).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!(
                    endpoint = %self.endpoint,
                    error = %e,
                    "Modbus operation failed; invalidating connection"
                );
                let _ = transport.disconnect().await;
                Err(e)
            }
        }
    }

    /// Attempts to connect, reporting reachability without raising.
    pub async fn probe(&self) -> bool {
        let mut transport = self.transport.lock().await;
        if transport.is_connected() {
            return true;
        }
        transport.connect().await.is_ok()
    }

    /// Returns `true` if the underlying transport is connected.
    pub async fn is_connected(&self) -> bool {
        self.transport.lock().await.is_connected()
    }

    /// Closes the underlying transport.
    pub async fn close(&self) -> ModbusResult<()> {
        let mut transport = self.transport.lock().await;
        transport.disconnect().await
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

// =============================================================================
// ConnectionManager
// =============================================================================

/// Factory creating a transport for an endpoint.
///
/// The default factory builds [`TcpTransport`]s; tests inject mock
/// transports through [`ConnectionManager::with_factory`].
pub type TransportFactory = Arc<dyn Fn(&Endpoint) -> Box<dyn ModbusTransport> + Send + Sync>;

/// Maps endpoints to live connections.
///
/// The endpoint map is the only shared mutable state in the core; `DashMap`
/// serializes its mutations, so two concurrent callers naming the same new
/// endpoint cannot both insert a connection object.
pub struct ConnectionManager {
    connections: DashMap<Endpoint, Arc<Connection>>,
    factory: TransportFactory,
}

impl ConnectionManager {
    /// Creates a manager producing TCP transports with the given
    /// connection parameters.
    pub fn new(config: ConnectConfig) -> Self {
        let factory: TransportFactory = Arc::new(move |endpoint: &Endpoint| {
            Box::new(TcpTransport::new(
                endpoint.host.clone(),
                endpoint.port,
                config.clone(),
            )) as Box<dyn ModbusTransport>
        });
        Self::with_factory(factory)
    }

    /// Creates a manager with a custom transport factory.
    pub fn with_factory(factory: TransportFactory) -> Self {
        Self {
            connections: DashMap::new(),
            factory,
        }
    }

    /// Returns the connection for an endpoint, creating it on first use.
    pub fn get(&self, host: &str, port: u16) -> Arc<Connection> {
        let endpoint = Endpoint::new(host, port);
        self.connections
            .entry(endpoint.clone())
            .or_insert_with(|| {
                tracing::debug!(endpoint = %endpoint, "Tracking new Modbus endpoint");
                Arc::new(Connection::new(endpoint.clone(), (self.factory)(&endpoint)))
            })
            .clone()
    }

    /// Returns the number of tracked endpoints.
    pub fn endpoint_count(&self) -> usize {
        self.connections.len()
    }

    /// Returns all tracked endpoints.
    pub fn endpoints(&self) -> Vec<Endpoint> {
        self.connections.iter().map(|e| e.key().clone()).collect()
    }

    /// Probes reachability of an endpoint without raising.
    pub async fn test_connection(&self, host: &str, port: u16) -> bool {
        self.get(host, port).probe().await
    }

    /// Closes every tracked connection.
    ///
    /// Individual close failures are logged, never propagated; endpoints
    /// that are already closed are skipped harmlessly.
    pub async fn close_all(&self) {
        let connections: Vec<Arc<Connection>> =
            self.connections.iter().map(|e| e.value().clone()).collect();

        let mut closed = Vec::new();
        for connection in connections {
            match connection.close().await {
                Ok(()) => closed.push(connection.endpoint().to_string()),
                Err(e) => {
                    tracing::error!(
                        endpoint = %connection.endpoint(),
                        error = %e,
                        "Failed to close Modbus connection"
                    );
                }
            }
        }
        self.connections.clear();

        tracing::info!(endpoints = ?closed, "Closed Modbus connections");
    }
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("endpoint_count", &self.connections.len())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex as StdMutex;

    use super::super::transport::TransportState;

    #[derive(Default)]
    struct StubShared {
        registers: StdMutex<HashMap<u16, u16>>,
        fail_next_read: AtomicBool,
    }

    struct StubTransport {
        shared: Arc<StubShared>,
        connected: bool,
    }

    #[async_trait]
    impl ModbusTransport for StubTransport {
        async fn connect(&mut self) -> ModbusResult<()> {
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
            if self.shared.fail_next_read.swap(false, Ordering::SeqCst) {
                return Err(ModbusError::read_failed(address.to_string(), "injected"));
            }
            let registers = self.shared.registers.lock().unwrap();
            Ok((address..address + count)
                .map(|a| registers.get(&a).copied().unwrap_or(0))
                .collect())
        }

        async fn write_single_register(
            &mut self,
            _unit_id: u8,
            address: u16,
            value: u16,
        ) -> ModbusResult<()> {
            self.shared.registers.lock().unwrap().insert(address, value);
            Ok(())
        }

        fn display_name(&self) -> String {
            "stub".to_string()
        }
    }

    fn stub_manager_with(shared: Arc<StubShared>) -> ConnectionManager {
        ConnectionManager::with_factory(Arc::new(move |_| {
            Box::new(StubTransport {
                shared: shared.clone(),
                connected: false,
            }) as Box<dyn ModbusTransport>
        }))
    }

    fn stub_manager() -> ConnectionManager {
        stub_manager_with(Arc::new(StubShared::default()))
    }

    #[test]
    fn test_endpoint_display() {
        assert_eq!(Endpoint::new("10.0.0.1", 502).to_string(), "10.0.0.1:502");
    }

    #[tokio::test]
    async fn test_connection_reused_per_endpoint() {
        let manager = stub_manager();

        let a = manager.get("10.0.0.1", 502);
        let b = manager.get("10.0.0.1", 502);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(manager.endpoint_count(), 1);

        let c = manager.get("10.0.0.2", 502);
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(manager.endpoint_count(), 2);
    }

    #[tokio::test]
    async fn test_read_write_round_trip() {
        let manager = stub_manager();
        let connection = manager.get("10.0.0.1", 502);

        connection.write_register(1, 2000, 0x1234).await.unwrap();
        let word = connection.read_holding_register(1, 2000).await.unwrap();
        assert_eq!(word, 0x1234);
    }

    #[tokio::test]
    async fn test_failed_operation_invalidates_connection() {
        let shared = Arc::new(StubShared::default());
        let manager = stub_manager_with(shared.clone());
        let connection = manager.get("10.0.0.1", 502);

        // Prime the connection, then inject a failure.
        connection.write_register(1, 0, 1).await.unwrap();
        assert!(connection.is_connected().await);

        shared.fail_next_read.store(true, Ordering::SeqCst);
        assert!(connection.read_holding_register(1, 0).await.is_err());

        // The failed operation must have invalidated the transport so the
        // next call reconnects rather than reusing a dead socket.
        assert!(!connection.is_connected().await);
        let word = connection.read_holding_register(1, 0).await.unwrap();
        assert_eq!(word, 1);
        assert!(connection.is_connected().await);
    }

    #[tokio::test]
    async fn test_close_all_is_idempotent() {
        let manager = stub_manager();
        let connection = manager.get("10.0.0.1", 502);
        connection.write_register(1, 0, 1).await.unwrap();

        manager.close_all().await;
        assert_eq!(manager.endpoint_count(), 0);

        // Second call with nothing tracked must not panic.
        manager.close_all().await;
    }
}
