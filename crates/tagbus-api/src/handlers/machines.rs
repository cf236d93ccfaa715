// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Machine and tag configuration handlers.

use std::collections::{BTreeMap, HashMap};

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use tagbus_core::error::StoreError;
use tagbus_core::schema::{MachineConfig, TagConfig, DEFAULT_MODBUS_PORT, DEFAULT_UNIT_ID};
use tagbus_core::types::{MachineName, TagName};

use crate::error::ApiResult;
use crate::response::ApiResponse;
use crate::state::AppState;

// =============================================================================
// Machines
// =============================================================================

/// GET /machine
///
/// Returns the full registered machine/tag configuration.
pub async fn list_machines(
    State(state): State<AppState>,
) -> ApiResponse<HashMap<MachineName, MachineConfig>> {
    ApiResponse::success("기계 목록 조회 성공", state.directory().export())
}

/// Query parameters for machine registration.
#[derive(Debug, Deserialize)]
pub struct MachineQuery {
    /// Device host address.
    pub ip_address: String,
    /// Device TCP port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Modbus unit id.
    #[serde(default = "default_slave")]
    pub slave: u8,
}

fn default_port() -> u16 {
    DEFAULT_MODBUS_PORT
}

fn default_slave() -> u8 {
    DEFAULT_UNIT_ID
}

/// POST /machine/{machine_name}
///
/// Adds or updates a machine endpoint (last-write-wins upsert).
pub async fn upsert_machine(
    State(state): State<AppState>,
    Path(machine_name): Path<String>,
    Query(query): Query<MachineQuery>,
) -> ApiResult<ApiResponse<()>> {
    state
        .directory()
        .upsert_machine(&machine_name, &query.ip_address, query.port, query.slave)
        .await?;

    let name = MachineName::new(&machine_name);
    Ok(ApiResponse::message_only(format!(
        "기계 {}가 등록/갱신되었습니다.",
        name
    )))
}

/// DELETE /machine/{machine_name}
pub async fn delete_machine(
    State(state): State<AppState>,
    Path(machine_name): Path<String>,
) -> ApiResult<ApiResponse<()>> {
    let removed = state.directory().delete_machine(&machine_name).await?;
    if !removed {
        return Err(StoreError::machine_not_found(MachineName::new(&machine_name).as_str()).into());
    }

    Ok(ApiResponse::message_only(format!(
        "기계 {}가 삭제되었습니다.",
        MachineName::new(&machine_name)
    )))
}

// =============================================================================
// Tags
// =============================================================================

/// GET /machine/{machine_name}/tags
pub async fn list_tags(
    State(state): State<AppState>,
    Path(machine_name): Path<String>,
) -> ApiResult<ApiResponse<BTreeMap<TagName, TagConfig>>> {
    let machine = state.directory().machine(&machine_name)?;
    Ok(ApiResponse::success("태그 목록 조회 성공", machine.tags))
}

/// POST /machine/{machine_name}/tags/{tag_name}
///
/// Adds a tag; the definition is validated before it is persisted.
pub async fn add_tag(
    State(state): State<AppState>,
    Path((machine_name, tag_name)): Path<(String, String)>,
    Json(tag_config): Json<TagConfig>,
) -> ApiResult<ApiResponse<()>> {
    state
        .directory()
        .add_tag(&machine_name, &tag_name, tag_config)
        .await?;

    Ok(ApiResponse::message_only(format!(
        "태그 {}가 {}에 추가되었습니다.",
        TagName::new(&tag_name),
        MachineName::new(&machine_name)
    )))
}

/// PUT /machine/{machine_name}/tags/{tag_name}
pub async fn update_tag(
    State(state): State<AppState>,
    Path((machine_name, tag_name)): Path<(String, String)>,
    Json(tag_config): Json<TagConfig>,
) -> ApiResult<ApiResponse<()>> {
    state
        .directory()
        .update_tag(&machine_name, &tag_name, tag_config)
        .await?;

    Ok(ApiResponse::message_only(format!(
        "태그 {}가 업데이트되었습니다.",
        TagName::new(&tag_name)
    )))
}

/// DELETE /machine/{machine_name}/tags/{tag_name}
pub async fn delete_tag(
    State(state): State<AppState>,
    Path((machine_name, tag_name)): Path<(String, String)>,
) -> ApiResult<ApiResponse<()>> {
    state
        .directory()
        .delete_tag(&machine_name, &tag_name)
        .await?;

    Ok(ApiResponse::message_only(format!(
        "태그 {}가 {}에서 삭제되었습니다.",
        TagName::new(&tag_name),
        MachineName::new(&machine_name)
    )))
}
