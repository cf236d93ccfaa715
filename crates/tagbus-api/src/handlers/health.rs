// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Health endpoint.

use axum::extract::State;
use serde::Serialize;

use crate::response::ApiResponse;
use crate::state::AppState;

/// Health payload.
#[derive(Debug, Serialize)]
pub struct HealthData {
    /// Overall status.
    pub status: String,
    /// Gateway version.
    pub version: String,
    /// Number of registered machines.
    pub machines: usize,
    /// Number of tracked Modbus endpoints.
    pub endpoints: usize,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> ApiResponse<HealthData> {
    ApiResponse::success(
        "상태 조회 성공",
        HealthData {
            status: "ok".to_string(),
            version: tagbus_core::VERSION.to_string(),
            machines: state.directory().snapshot().len(),
            endpoints: state.connections().endpoint_count(),
        },
    )
}
