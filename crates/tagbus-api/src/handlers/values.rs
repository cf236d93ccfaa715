// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Symbolic tag value handlers.

use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use serde::Deserialize;

use tagbus_core::types::TagValue;
use tagbus_gateway::TagReading;

use crate::error::{ApiError, ApiResult};
use crate::response::ApiResponse;
use crate::state::AppState;

/// GET /machine/{machine_name}/tags/{tag_name}/value
pub async fn read_tag_value(
    State(state): State<AppState>,
    Path((machine_name, tag_name)): Path<(String, String)>,
) -> ApiResult<ApiResponse<TagValue>> {
    let value = state.gateway.read_tag(&machine_name, &tag_name).await?;
    Ok(ApiResponse::success("태그 값 읽기 성공", value))
}

/// Query parameters for a tag write.
#[derive(Debug, Deserialize)]
pub struct WriteQuery {
    /// Decimal literal, mode keyword, or `*` (toggle).
    pub value: String,
}

/// POST /machine/{machine_name}/tags/{tag_name}/value
pub async fn write_tag_value(
    State(state): State<AppState>,
    Path((machine_name, tag_name)): Path<(String, String)>,
    Query(query): Query<WriteQuery>,
) -> ApiResult<ApiResponse<TagValue>> {
    let value = state
        .gateway
        .write_tag(&machine_name, &tag_name, &query.value)
        .await?;
    Ok(ApiResponse::success("태그 값 쓰기 성공", value))
}

/// Query parameters for a bulk read.
#[derive(Debug, Deserialize)]
pub struct BulkQuery {
    /// Comma-separated tag names.
    pub tags: String,
}

/// GET /machine/{machine_name}/values?tags=PV,SV
///
/// Reads several tags concurrently. Each tag yields its value or its own
/// error string; the response succeeds even when individual tags fail.
pub async fn read_tag_values(
    State(state): State<AppState>,
    Path(machine_name): Path<String>,
    Query(query): Query<BulkQuery>,
) -> ApiResult<ApiResponse<BTreeMap<String, TagReading>>> {
    let tags: Vec<String> = query
        .tags
        .split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    if tags.is_empty() {
        return Err(ApiError::bad_request("요청한 태그가 없습니다"));
    }

    let data = state.gateway.read_tags(&machine_name, &tags).await;
    Ok(ApiResponse::success(
        format!("{} 기계의 선택한 태그 값 조회 성공", machine_name.to_uppercase()),
        data,
    ))
}
