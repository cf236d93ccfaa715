// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Bulk configuration import/export handlers.

use std::collections::HashMap;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use tagbus_core::schema::MachineConfig;
use tagbus_core::types::MachineName;

use crate::error::ApiResult;
use crate::response::ApiResponse;
use crate::state::AppState;

/// Directory the export handler writes snapshots into.
const EXPORT_DIR: &str = "logs/config";

/// POST /config/import
///
/// Upserts every named machine and replaces its tag set, then reloads the
/// projection once.
pub async fn import_config(
    State(state): State<AppState>,
    Json(document): Json<HashMap<MachineName, MachineConfig>>,
) -> ApiResult<ApiResponse<()>> {
    let count = document.len();
    state.directory().import(document).await?;
    Ok(ApiResponse::message_only(format!(
        "{}개 기계 설정을 등록했습니다.",
        count
    )))
}

/// Export payload: the configuration and where it was saved.
#[derive(Debug, Serialize)]
pub struct ExportResult {
    /// The exported configuration document.
    pub config: HashMap<MachineName, MachineConfig>,
    /// Path of the snapshot file written on disk.
    pub saved_path: String,
}

/// GET /config/export
pub async fn export_config(State(state): State<AppState>) -> ApiResult<ApiResponse<ExportResult>> {
    let path = state.directory().export_to_file(EXPORT_DIR)?;
    let config = state.directory().export();

    Ok(ApiResponse::success(
        "설정 추출 성공",
        ExportResult {
            config,
            saved_path: path.display().to_string(),
        },
    ))
}
