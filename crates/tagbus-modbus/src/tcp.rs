// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Modbus TCP transport implementation.
//!
//! This module provides the TCP transport for Modbus communication using
//! the `tokio-modbus` crate as the underlying implementation. Connecting
//! applies a per-attempt timeout and a bounded retry budget; individual
//! register operations apply the operation timeout but are never retried
//! here.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_modbus::client::Context as ModbusContext;
use tokio_modbus::prelude::*;
use tokio_modbus::{Error as TokioModbusError, ExceptionCode};

use tagbus_core::error::{ModbusError, ModbusResult};

use super::transport::{ModbusTransport, TransportState};

// =============================================================================
// ConnectConfig
// =============================================================================

/// Connection parameters applied to every endpoint.
///
/// Timeout and retry counts are fixed connection parameters applied per
/// connection attempt, not per individual register operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectConfig {
    /// Timeout for a single connect attempt.
    #[serde(default = "default_connect_timeout")]
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,

    /// Timeout for a single register operation.
    #[serde(default = "default_operation_timeout")]
    #[serde(with = "humantime_serde")]
    pub operation_timeout: Duration,

    /// Number of connect retries after the first failed attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay between connect attempts.
    #[serde(default = "default_retry_delay")]
    #[serde(with = "humantime_serde")]
    pub retry_delay: Duration,

    /// Enable TCP_NODELAY on the socket.
    #[serde(default = "default_true")]
    pub tcp_nodelay: bool,
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(3)
}

fn default_operation_timeout() -> Duration {
    Duration::from_secs(3)
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay() -> Duration {
    Duration::from_millis(500)
}

fn default_true() -> bool {
    true
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            operation_timeout: default_operation_timeout(),
            max_retries: default_max_retries(),
            retry_delay: default_retry_delay(),
            tcp_nodelay: true,
        }
    }
}

// =============================================================================
// TcpTransport
// =============================================================================

/// Modbus TCP transport using tokio-modbus.
pub struct TcpTransport {
    host: String,
    port: u16,
    config: ConnectConfig,
    context: Option<ModbusContext>,
    state: TransportState,
}

enum OpKind {
    Read,
    Write,
}

impl TcpTransport {
    /// Creates a new TCP transport for the given endpoint.
    pub fn new(host: impl Into<String>, port: u16, config: ConnectConfig) -> Self {
        Self {
            host: host.into(),
            port,
            config,
            context: None,
            state: TransportState::Disconnected,
        }
    }

    /// Creates a transport with default connection parameters.
    pub fn simple(host: impl Into<String>, port: u16) -> Self {
        Self::new(host, port, ConnectConfig::default())
    }

    /// Returns the endpoint as `host:port`.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Resolves the socket address, trying a literal `ip:port` first and
    /// falling back to DNS.
    async fn resolve_address(&self) -> ModbusResult<SocketAddr> {
        let addr_str = self.endpoint();

        if let Ok(addr) = addr_str.parse::<SocketAddr>() {
            return Ok(addr);
        }

        let mut addrs = tokio::net::lookup_host(&addr_str).await.map_err(|e| {
            ModbusError::connection_failed_with(
                &self.host,
                self.port,
                format!("DNS resolution failed for '{}'", self.host),
                e,
            )
        })?;

        addrs.next().ok_or_else(|| {
            ModbusError::connection_failed(
                &self.host,
                self.port,
                format!("no address resolved for '{}'", self.host),
            )
        })
    }

    /// A single connect attempt, bounded by the connect timeout.
    async fn try_connect(&self) -> ModbusResult<ModbusContext> {
        let socket_addr = self.resolve_address().await?;

        let connect_future = async {
            let stream = TcpStream::connect(socket_addr).await.map_err(|e| {
                ModbusError::connection_failed_with(
                    &self.host,
                    self.port,
                    e.to_string(),
                    e,
                )
            })?;
            stream.set_nodelay(self.config.tcp_nodelay).ok();

            Ok::<_, ModbusError>(tcp::attach_slave(stream, Slave(tagbus_core::DEFAULT_UNIT_ID)))
        };

        timeout(self.config.connect_timeout, connect_future)
            .await
            .map_err(|_| {
                ModbusError::connection_failed(
                    &self.host,
                    self.port,
                    format!(
                        "connect timed out after {:?}",
                        self.config.connect_timeout
                    ),
                )
            })?
    }

    /// Maps a tokio-modbus transport error to ModbusError.
    fn map_transport_error(
        &self,
        error: TokioModbusError,
        kind: OpKind,
        address: u16,
    ) -> ModbusError {
        match error {
            TokioModbusError::Transport(io_error) => {
                use std::io::ErrorKind;
                match io_error.kind() {
                    ErrorKind::TimedOut => ModbusError::timeout(self.config.operation_timeout),
                    ErrorKind::NotConnected => ModbusError::NotConnected,
                    _ => ModbusError::connection_failed_with(
                        &self.host,
                        self.port,
                        io_error.to_string(),
                        io_error,
                    ),
                }
            }
            TokioModbusError::Protocol(protocol_error) => {
                self.op_error(kind, address, format!("protocol error: {:?}", protocol_error))
            }
        }
    }

    /// Maps a device exception response to ModbusError.
    fn map_exception(&self, exception: ExceptionCode, kind: OpKind, address: u16) -> ModbusError {
        self.op_error(kind, address, format!("device exception: {:?}", exception))
    }

    fn op_error(&self, kind: OpKind, address: u16, message: String) -> ModbusError {
        match kind {
            OpKind::Read => ModbusError::read_failed(address.to_string(), message),
            OpKind::Write => ModbusError::write_failed(address.to_string(), message),
        }
    }
}

#[async_trait]
impl ModbusTransport for TcpTransport {
    async fn connect(&mut self) -> ModbusResult<()> {
        if self.state == TransportState::Connected {
            return Ok(());
        }

        self.state = TransportState::Connecting;

        let mut last_error = None;
        for attempt in 0..=self.config.max_retries {
            match self.try_connect().await {
                Ok(ctx) => {
                    self.context = Some(ctx);
                    self.state = TransportState::Connected;

                    tracing::info!(
                        host = %self.host,
                        port = self.port,
                        attempt,
                        "Connected to Modbus TCP device"
                    );
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(
                        host = %self.host,
                        port = self.port,
                        attempt,
                        error = %e,
                        "Modbus connect attempt failed"
                    );
                    last_error = Some(e);
                    if attempt < self.config.max_retries {
                        tokio::time::sleep(self.config.retry_delay).await;
                    }
                }
            }
        }

        self.state = TransportState::Disconnected;
        Err(last_error.unwrap_or_else(|| {
            ModbusError::connection_failed(&self.host, self.port, "connect failed")
        }))
    }

    async fn disconnect(&mut self) -> ModbusResult<()> {
        if let Some(mut ctx) = self.context.take() {
            if let Err(e) = ctx.disconnect().await {
                tracing::warn!(
                    host = %self.host,
                    port = self.port,
                    error = %e,
                    "Error disconnecting from Modbus device"
                );
            }
        }
        self.state = TransportState::Disconnected;

        tracing::debug!(
            host = %self.host,
            port = self.port,
            "Disconnected from Modbus TCP device"
        );

        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state == TransportState::Connected
    }

    fn state(&self) -> TransportState {
        self.state
    }

    async fn read_holding_registers(
        &mut self,
        unit_id: u8,
        address: u16,
        count: u16,
    ) -> ModbusResult<Vec<u16>> {
        let operation_timeout = self.config.operation_timeout;
        let result = {
            let ctx = self.context.as_mut().ok_or(ModbusError::NotConnected)?;
            ctx.set_slave(Slave(unit_id));
            timeout(operation_timeout, ctx.read_holding_registers(address, count)).await
        };

        match result {
            Err(_) => Err(ModbusError::timeout(operation_timeout)),
            Ok(Err(e)) => Err(self.map_transport_error(e, OpKind::Read, address)),
            Ok(Ok(Err(exception))) => Err(self.map_exception(exception, OpKind::Read, address)),
            Ok(Ok(Ok(words))) => Ok(words),
        }
    }

    async fn write_single_register(
        &mut self,
        unit_id: u8,
        address: u16,
        value: u16,
    ) -> ModbusResult<()> {
        let operation_timeout = self.config.operation_timeout;
        let result = {
            let ctx = self.context.as_mut().ok_or(ModbusError::NotConnected)?;
            ctx.set_slave(Slave(unit_id));
            timeout(operation_timeout, ctx.write_single_register(address, value)).await
        };

        match result {
            Err(_) => Err(ModbusError::timeout(operation_timeout)),
            Ok(Err(e)) => Err(self.map_transport_error(e, OpKind::Write, address)),
            Ok(Ok(Err(exception))) => Err(self.map_exception(exception, OpKind::Write, address)),
            Ok(Ok(Ok(()))) => Ok(()),
        }
    }

    fn display_name(&self) -> String {
        format!("Modbus TCP {}:{}", self.host, self.port)
    }
}

impl std::fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpTransport")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("state", &self.state)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
