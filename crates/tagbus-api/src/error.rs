// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API error type and HTTP status mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use tagbus_core::error::{ConfigError, ControlError, GatewayError, ModbusError, StoreError};

use crate::response::ApiResponse;

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// ApiError
// =============================================================================

/// Error returned from handlers, converted into an error envelope with the
/// status code the underlying gateway error maps to.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A gateway-layer error.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Malformed request input.
    #[error("Bad request: {message}")]
    BadRequest {
        /// Error message.
        message: String,
    },

    /// Server-side failure outside the gateway layers.
    #[error("Internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl ApiError {
    /// Creates a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest { message: message.into() }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    /// Returns the HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Gateway(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the user-facing message.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Gateway(e) => e.user_message(),
            ApiError::BadRequest { message } => message.clone(),
            ApiError::Internal { .. } => "서버 내부 오류가 발생했습니다".to_string(),
        }
    }

    /// Returns the error code label.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Gateway(e) => e.error_type(),
            ApiError::BadRequest { .. } => "bad_request",
            ApiError::Internal { .. } => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "API request failed");
        } else {
            tracing::debug!(error = %self, "API request rejected");
        }

        let body = ApiResponse::<()>::failure(self.user_message(), self.code(), self.to_string());
        (status, Json(body)).into_response()
    }
}

// Lift the per-layer errors through GatewayError so handlers can use `?`
// directly on store/control/config results.

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self::Gateway(e.into())
    }
}

impl From<ControlError> for ApiError {
    fn from(e: ControlError) -> Self {
        Self::Gateway(e.into())
    }
}

impl From<ConfigError> for ApiError {
    fn from(e: ConfigError) -> Self {
        Self::Gateway(e.into())
    }
}

impl From<ModbusError> for ApiError {
    fn from(e: ModbusError) -> Self {
        Self::Gateway(e.into())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let err: ApiError = StoreError::machine_not_found("GHOST").into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err: ApiError = ControlError::tag_read_only("PV").into();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

        let err: ApiError = ModbusError::NotConnected.into();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let err = ApiError::bad_request("missing value");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
