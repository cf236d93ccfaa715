// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Auto-control handlers.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use tagbus_gateway::{ControlPlan, ControlState, ExecutionSummary};

use crate::error::{ApiError, ApiResult};
use crate::response::ApiResponse;
use crate::state::AppState;

/// POST /autocontrol/configure
pub async fn configure(
    State(state): State<AppState>,
    Json(plan): Json<ControlPlan>,
) -> ApiResult<ApiResponse<ControlState>> {
    let enabled = plan.enabled;
    let stored = state.autocontrol.configure(plan);
    Ok(ApiResponse::success(
        format!("자동 제어 설정이 구성되었습니다 (활성화: {})", enabled),
        stored,
    ))
}

/// Query parameters for toggling auto-control.
#[derive(Debug, Deserialize)]
pub struct ToggleQuery {
    /// The new enabled state.
    pub enabled: bool,
}

/// POST /autocontrol/toggle
pub async fn toggle(
    State(state): State<AppState>,
    Query(query): Query<ToggleQuery>,
) -> ApiResult<ApiResponse<ControlState>> {
    let stored = state.autocontrol.set_enabled(query.enabled)?;
    let label = if query.enabled { "활성화" } else { "비활성화" };
    Ok(ApiResponse::success(
        format!("자동 제어 모드가 {}되었습니다", label),
        stored,
    ))
}

/// GET /autocontrol/status
pub async fn status(State(state): State<AppState>) -> ApiResult<ApiResponse<ControlState>> {
    let stored = state.autocontrol.status()?;
    Ok(ApiResponse::success("자동 제어 상태 조회 성공", stored))
}

/// POST /autocontrol/execute
///
/// Runs one control pass, with an optional one-shot plan in the body;
/// without a body the stored plan executes.
pub async fn execute(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<ApiResponse<ExecutionSummary>> {
    let plan: Option<ControlPlan> = if body.is_empty() {
        None
    } else {
        Some(serde_json::from_slice(&body).map_err(|e| {
            ApiError::bad_request(format!("잘못된 제어 계획 형식입니다: {}", e))
        })?)
    };

    let summary = state.autocontrol.execute(plan).await?;
    Ok(ApiResponse::success(
        format!(
            "자동 제어 실행 완료: {}개 태그 중 {}개 변경, {}개 유지",
            summary.control_count, summary.changed_count, summary.unchanged_count
        ),
        summary,
    ))
}
