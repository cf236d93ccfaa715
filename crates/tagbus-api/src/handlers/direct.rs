// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Direct register access, bypassing the directory.
//!
//! These endpoints address a device by explicit `host`/`port`/`slave`
//! query parameters and a raw register (or `register.bit`) path, for
//! commissioning and debugging before any tags are configured.

use axum::extract::{Path, Query, State};
use serde::Deserialize;

use tagbus_core::schema::{DEFAULT_MODBUS_PORT, DEFAULT_UNIT_ID};
use tagbus_core::types::{Mode, ModeKind, TagType};
use tagbus_core::RegisterAddress;
use tagbus_modbus::MachineClient;

use crate::error::{ApiError, ApiResult};
use crate::response::ApiResponse;
use crate::state::AppState;

fn default_port() -> u16 {
    DEFAULT_MODBUS_PORT
}

fn default_slave() -> u8 {
    DEFAULT_UNIT_ID
}

fn default_kind() -> u8 {
    1
}

// 0: AUTO/MANUAL, 1: LOCAL/REMOTE, anything else: ON/OFF.
fn kind_from_code(code: u8) -> ModeKind {
    match code {
        0 => ModeKind::AutoManual,
        1 => ModeKind::LocalRemote,
        _ => ModeKind::Generic,
    }
}

fn client(state: &AppState, host: &str, port: u16, slave: u8) -> MachineClient {
    MachineClient::new(state.connections().get(host, port), slave)
}

fn parse_register_bit(raw: &str) -> ApiResult<(u16, u8)> {
    match RegisterAddress::parse(raw, TagType::Digital)? {
        RegisterAddress::Bit { register, bit } => Ok((register, bit)),
        RegisterAddress::Word(_) => Err(ApiError::bad_request("레지스터.비트 형식이 아닙니다")),
    }
}

// =============================================================================
// Analog
// =============================================================================

/// Endpoint query parameters.
#[derive(Debug, Deserialize)]
pub struct AnalogReadQuery {
    /// Device host address.
    pub host: String,
    /// Device TCP port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Modbus unit id.
    #[serde(default = "default_slave")]
    pub slave: u8,
}

/// GET /direct/analog/{register}
pub async fn read_analog(
    State(state): State<AppState>,
    Path(register): Path<u16>,
    Query(query): Query<AnalogReadQuery>,
) -> ApiResult<ApiResponse<u16>> {
    let client = client(&state, &query.host, query.port, query.slave);
    let value = client.read_register(register).await?;
    Ok(ApiResponse::success("아날로그 값 읽기 성공", value))
}

/// Endpoint plus value query parameters.
#[derive(Debug, Deserialize)]
pub struct AnalogWriteQuery {
    /// Device host address.
    pub host: String,
    /// Device TCP port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Modbus unit id.
    #[serde(default = "default_slave")]
    pub slave: u8,
    /// Value to write.
    pub value: u16,
}

/// POST /direct/analog/{register}
pub async fn write_analog(
    State(state): State<AppState>,
    Path(register): Path<u16>,
    Query(query): Query<AnalogWriteQuery>,
) -> ApiResult<ApiResponse<u16>> {
    let client = client(&state, &query.host, query.port, query.slave);
    let value = client.write_register(register, query.value).await?;
    Ok(ApiResponse::success("아날로그 값 쓰기 성공", value))
}

// =============================================================================
// Digital
// =============================================================================

/// Endpoint plus bit-kind query parameters.
#[derive(Debug, Deserialize)]
pub struct DigitalReadQuery {
    /// Device host address.
    pub host: String,
    /// Device TCP port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Modbus unit id.
    #[serde(default = "default_slave")]
    pub slave: u8,
    /// 0: AUTO/MANUAL, 1: LOCAL/REMOTE (default 1).
    #[serde(rename = "type", default = "default_kind")]
    pub kind: u8,
}

/// GET /direct/digital/{register_bit}
///
/// `register_bit` is a `"register.bit"` address, e.g. `1200.1`.
pub async fn read_digital(
    State(state): State<AppState>,
    Path(register_bit): Path<String>,
    Query(query): Query<DigitalReadQuery>,
) -> ApiResult<ApiResponse<Mode>> {
    let (register, bit) = parse_register_bit(&register_bit)?;
    let client = client(&state, &query.host, query.port, query.slave);
    let mode = client.read_bit(register, bit, kind_from_code(query.kind)).await?;
    Ok(ApiResponse::success("디지털 값 읽기 성공", mode))
}

/// Endpoint plus target-state query parameters.
#[derive(Debug, Deserialize)]
pub struct DigitalWriteQuery {
    /// Device host address.
    pub host: String,
    /// Device TCP port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Modbus unit id.
    #[serde(default = "default_slave")]
    pub slave: u8,
    /// 0: AUTO/MANUAL, 1: LOCAL/REMOTE (default 1).
    #[serde(rename = "type", default = "default_kind")]
    pub kind: u8,
    /// true: MANUAL/REMOTE/ON, false: AUTO/LOCAL/OFF.
    pub state: bool,
}

/// POST /direct/digital/{register_bit}
pub async fn write_digital(
    State(state): State<AppState>,
    Path(register_bit): Path<String>,
    Query(query): Query<DigitalWriteQuery>,
) -> ApiResult<ApiResponse<Mode>> {
    let (register, bit) = parse_register_bit(&register_bit)?;
    let client = client(&state, &query.host, query.port, query.slave);
    let mode = client
        .write_bit(register, bit, query.state, kind_from_code(query.kind))
        .await?;
    Ok(ApiResponse::success("디지털 값 쓰기 성공", mode))
}

// =============================================================================
// Connection Test
// =============================================================================

/// Endpoint query parameters for a connection probe.
#[derive(Debug, Deserialize)]
pub struct TestQuery {
    /// Device host address.
    pub host: String,
    /// Device TCP port.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// GET /direct/test
///
/// Probes endpoint reachability; never raises.
pub async fn test_connection(
    State(state): State<AppState>,
    Query(query): Query<TestQuery>,
) -> ApiResponse<bool> {
    let reachable = state.connections().test_connection(&query.host, query.port).await;
    let message = if reachable { "연결 성공" } else { "연결 실패" };
    ApiResponse::success(message, reachable)
}
