// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Unified error hierarchy for tagbus.
//!
//! This module defines the error types used across the gateway:
//!
//! ```text
//! GatewayError (root)
//! ├── ConfigError   - Tag/machine validation and config file handling
//! ├── ModbusError   - Transport and protocol failures
//! ├── StoreError    - Persistence and directory lookups
//! └── ControlError  - Permission and value errors raised before I/O
//! ```
//!
//! Every error maps to an HTTP status code via [`GatewayError::status_code`]
//! and carries a user-facing Korean message via
//! [`GatewayError::user_message`]. Errors are local, typed failures returned
//! to the immediate caller; nothing here is retried automatically except the
//! transport's own connect-retry budget.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

// =============================================================================
// GatewayError - Root Error Type
// =============================================================================

/// The root error type for tagbus.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Configuration or validation error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Modbus transport or protocol error.
    #[error("Modbus error: {0}")]
    Modbus(#[from] ModbusError),

    /// Persistence or directory error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Control error (permission, value, sequencing).
    #[error("Control error: {0}")]
    Control(#[from] ControlError),
}

impl GatewayError {
    /// Returns `true` if a subsequent attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Modbus(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::Config(_) => 400,
            GatewayError::Modbus(e) => e.status_code(),
            GatewayError::Store(e) => e.status_code(),
            GatewayError::Control(e) => e.status_code(),
        }
    }

    /// Returns the error type as a string for logging/metrics.
    pub fn error_type(&self) -> &'static str {
        match self {
            GatewayError::Config(_) => "config",
            GatewayError::Modbus(_) => "modbus",
            GatewayError::Store(_) => "store",
            GatewayError::Control(_) => "control",
        }
    }

    /// Returns a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::Config(e) => e.user_message(),
            GatewayError::Modbus(e) => e.user_message(),
            GatewayError::Store(e) => e.user_message(),
            GatewayError::Control(e) => e.user_message(),
        }
    }
}

// =============================================================================
// ConfigError
// =============================================================================

/// Configuration and validation errors.
///
/// These are raised at config-write time only; a tag that fails validation
/// is never admitted to the directory, so the read/write hot path does not
/// re-check.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Unknown tag type string.
    #[error("Invalid tag type '{value}': expected one of Analog, Digital, DigitalAM, DigitalRM")]
    InvalidTagType {
        /// The rejected value.
        value: String,
    },

    /// Unknown permission string.
    #[error("Invalid permission '{value}': expected Read or ReadWrite")]
    InvalidPermission {
        /// The rejected value.
        value: String,
    },

    /// Malformed register address string.
    #[error("Invalid address format '{address}': {reason}")]
    InvalidAddressFormat {
        /// The rejected address string.
        address: String,
        /// Which part of the grammar failed.
        reason: String,
    },

    /// Register number outside the permitted range.
    #[error("Register {register} in '{address}' is out of range (0-9999)")]
    RegisterOutOfRange {
        /// The full address string.
        address: String,
        /// The offending register number.
        register: u32,
    },

    /// Bit position outside 0-15.
    #[error("Bit {bit} in '{address}' is out of range (0-15)")]
    BitOutOfRange {
        /// The full address string.
        address: String,
        /// The offending bit position.
        bit: u32,
    },

    /// Generic field validation failure.
    #[error("Validation failed for '{field}': {message}")]
    Validation {
        /// The field that failed validation.
        field: String,
        /// Error message.
        message: String,
    },

    /// Failed to parse a configuration file.
    #[error("Failed to parse config file '{path}': {message}")]
    Parse {
        /// Path to the configuration file.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Config file I/O error.
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        /// Path to the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Creates an invalid tag type error.
    pub fn invalid_tag_type(value: impl Into<String>) -> Self {
        Self::InvalidTagType { value: value.into() }
    }

    /// Creates an invalid permission error.
    pub fn invalid_permission(value: impl Into<String>) -> Self {
        Self::InvalidPermission { value: value.into() }
    }

    /// Creates an invalid address format error.
    pub fn invalid_address(address: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAddressFormat {
            address: address.into(),
            reason: reason.into(),
        }
    }

    /// Creates a generic validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a parse error.
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            ConfigError::InvalidTagType { value } => {
                format!("지원하지 않는 태그 타입입니다: {}", value)
            }
            ConfigError::InvalidPermission { value } => {
                format!("지원하지 않는 권한 값입니다: {}", value)
            }
            ConfigError::InvalidAddressFormat { address, .. } => format!(
                "입력 형식이 잘못되었습니다 ({}). '레지스터.비트' 형식으로 입력해주세요.",
                address
            ),
            ConfigError::RegisterOutOfRange { .. } => {
                "레지스터 주소는 0-9999 사이여야 합니다.".to_string()
            }
            ConfigError::BitOutOfRange { .. } => "비트 위치는 0-15 사이여야 합니다.".to_string(),
            ConfigError::Validation { field, message } => {
                format!("설정 검증 실패 ({}): {}", field, message)
            }
            ConfigError::Parse { path, message } => {
                format!("설정 파일 파싱 실패 ({}): {}", path.display(), message)
            }
            ConfigError::Io { path, .. } => {
                format!("설정 파일 읽기 실패: {}", path.display())
            }
        }
    }
}

// =============================================================================
// ModbusError
// =============================================================================

/// Modbus transport and protocol errors.
#[derive(Debug, Error)]
pub enum ModbusError {
    /// TCP connect or handshake failed.
    #[error("Connection failed to {host}:{port}: {message}")]
    ConnectionFailed {
        /// Target host.
        host: String,
        /// Target port.
        port: u16,
        /// Error message.
        message: String,
        /// Underlying error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("Operation timed out after {duration:?}")]
    Timeout {
        /// The timeout duration.
        duration: Duration,
    },

    /// No live connection is bound.
    #[error("Device is not connected")]
    NotConnected,

    /// The Modbus read transaction reported an error.
    #[error("Read failed for register {address}: {message}")]
    ReadFailed {
        /// The register address context.
        address: String,
        /// Error message.
        message: String,
    },

    /// The Modbus write transaction reported an error.
    #[error("Write failed for register {address}: {message}")]
    WriteFailed {
        /// The register address context.
        address: String,
        /// Error message.
        message: String,
    },

    /// The device returned an unusable response.
    #[error("Invalid response: {message}")]
    InvalidResponse {
        /// Error message.
        message: String,
    },
}

impl ModbusError {
    /// Creates a connection failed error.
    pub fn connection_failed(
        host: impl Into<String>,
        port: u16,
        message: impl Into<String>,
    ) -> Self {
        Self::ConnectionFailed {
            host: host.into(),
            port,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a connection failed error with a source.
    pub fn connection_failed_with<E>(
        host: impl Into<String>,
        port: u16,
        message: impl Into<String>,
        source: E,
    ) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ConnectionFailed {
            host: host.into(),
            port,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(duration: Duration) -> Self {
        Self::Timeout { duration }
    }

    /// Creates a read failed error.
    pub fn read_failed(address: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ReadFailed {
            address: address.into(),
            message: message.into(),
        }
    }

    /// Creates a write failed error.
    pub fn write_failed(address: impl Into<String>, message: impl Into<String>) -> Self {
        Self::WriteFailed {
            address: address.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse { message: message.into() }
    }

    /// Returns `true` if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ModbusError::ConnectionFailed { .. }
                | ModbusError::Timeout { .. }
                | ModbusError::NotConnected
        )
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ModbusError::ConnectionFailed { .. } | ModbusError::NotConnected => 503,
            ModbusError::Timeout { .. } => 504,
            _ => 500,
        }
    }

    /// Returns the error type for logging/metrics.
    pub fn error_type(&self) -> &'static str {
        match self {
            ModbusError::ConnectionFailed { .. } => "connection_failed",
            ModbusError::Timeout { .. } => "timeout",
            ModbusError::NotConnected => "not_connected",
            ModbusError::ReadFailed { .. } => "read_failed",
            ModbusError::WriteFailed { .. } => "write_failed",
            ModbusError::InvalidResponse { .. } => "invalid_response",
        }
    }

    /// Returns a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            ModbusError::ConnectionFailed { host, port, .. } => {
                format!("Modbus 서버 연결 실패 - host: {}, port: {}", host, port)
            }
            ModbusError::Timeout { duration } => {
                format!("응답 시간 초과 ({:.1}초)", duration.as_secs_f64())
            }
            ModbusError::NotConnected => "장비가 연결되어 있지 않습니다".to_string(),
            ModbusError::ReadFailed { address, .. } => {
                format!("레지스터 {}의 값 읽기 실패", address)
            }
            ModbusError::WriteFailed { address, .. } => {
                format!("레지스터 {}의 값 쓰기 실패", address)
            }
            ModbusError::InvalidResponse { .. } => "잘못된 응답을 받았습니다".to_string(),
        }
    }
}

// =============================================================================
// StoreError
// =============================================================================

/// Persistence and directory errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("Database error: {message}")]
    Database {
        /// Error message.
        message: String,
        /// Underlying error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Unknown machine name.
    #[error("Machine not found: {machine}")]
    MachineNotFound {
        /// The requested machine name.
        machine: String,
    },

    /// Unknown tag name on a known machine.
    #[error("Tag not found: {machine}.{tag}")]
    TagNotFound {
        /// The owning machine name.
        machine: String,
        /// The requested tag name.
        tag: String,
    },

    /// Tag already exists on the machine.
    #[error("Tag already exists: {machine}.{tag}")]
    DuplicateTag {
        /// The owning machine name.
        machine: String,
        /// The duplicated tag name.
        tag: String,
    },

    /// A persisted row no longer parses against the schema.
    #[error("Corrupted row: {message}")]
    InvalidRow {
        /// Error message.
        message: String,
    },
}

impl StoreError {
    /// Creates a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a database error with a source.
    pub fn database_with<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Database {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a machine not found error.
    pub fn machine_not_found(machine: impl Into<String>) -> Self {
        Self::MachineNotFound { machine: machine.into() }
    }

    /// Creates a tag not found error.
    pub fn tag_not_found(machine: impl Into<String>, tag: impl Into<String>) -> Self {
        Self::TagNotFound {
            machine: machine.into(),
            tag: tag.into(),
        }
    }

    /// Creates a duplicate tag error.
    pub fn duplicate_tag(machine: impl Into<String>, tag: impl Into<String>) -> Self {
        Self::DuplicateTag {
            machine: machine.into(),
            tag: tag.into(),
        }
    }

    /// Creates an invalid row error.
    pub fn invalid_row(message: impl Into<String>) -> Self {
        Self::InvalidRow { message: message.into() }
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            StoreError::MachineNotFound { .. } | StoreError::TagNotFound { .. } => 404,
            StoreError::DuplicateTag { .. } => 409,
            _ => 500,
        }
    }

    /// Returns a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            StoreError::Database { .. } => "데이터베이스 작업에 실패했습니다".to_string(),
            StoreError::MachineNotFound { .. } => "기계를 찾을 수 없습니다.".to_string(),
            StoreError::TagNotFound { tag, .. } => {
                format!("태그 '{}'를 찾을 수 없습니다.", tag)
            }
            StoreError::DuplicateTag { tag, .. } => {
                format!("태그 '{}'가 이미 존재합니다.", tag)
            }
            StoreError::InvalidRow { .. } => "저장된 설정이 손상되었습니다".to_string(),
        }
    }
}

// =============================================================================
// ControlError
// =============================================================================

/// Errors raised before any device I/O: permission violations, invalid
/// values, and caller-sequencing mistakes.
#[derive(Debug, Error)]
pub enum ControlError {
    /// Write attempted on a read-only tag.
    #[error("Tag is read-only: {tag}")]
    TagReadOnly {
        /// The tag name.
        tag: String,
    },

    /// A mode keyword that is not valid for the tag's kind.
    #[error("Invalid mode value '{value}': accepted values are {expected}")]
    InvalidModeValue {
        /// The rejected value.
        value: String,
        /// The two accepted keywords for this kind.
        expected: String,
    },

    /// A write value that cannot be applied to the tag.
    #[error("Invalid tag value '{value}': {reason}")]
    InvalidTagValue {
        /// The rejected value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Auto-control was used before being configured.
    #[error("Auto-control is not configured")]
    NotConfigured,

    /// Auto-control execution requested while disabled.
    #[error("Auto-control is disabled")]
    Disabled,

    /// An execution produced no control targets.
    #[error("No control targets")]
    NoTargets,

    /// Journal write failed.
    #[error("Failed to write control journal: {message}")]
    JournalWrite {
        /// Error message.
        message: String,
        /// Underlying I/O error.
        #[source]
        source: Option<std::io::Error>,
    },
}

impl ControlError {
    /// Creates a read-only tag error.
    pub fn tag_read_only(tag: impl Into<String>) -> Self {
        Self::TagReadOnly { tag: tag.into() }
    }

    /// Creates an invalid mode value error naming the accepted pair.
    pub fn invalid_mode(value: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::InvalidModeValue {
            value: value.into(),
            expected: expected.into(),
        }
    }

    /// Creates an invalid tag value error.
    pub fn invalid_value(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTagValue {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Creates a journal write error.
    pub fn journal_write(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::JournalWrite {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ControlError::TagReadOnly { .. } => 403,
            ControlError::InvalidModeValue { .. } | ControlError::InvalidTagValue { .. } => 400,
            ControlError::NotConfigured | ControlError::Disabled => 409,
            ControlError::NoTargets => 400,
            ControlError::JournalWrite { .. } => 500,
        }
    }

    /// Returns a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            ControlError::TagReadOnly { tag } => {
                format!("읽기 전용 태그입니다: {}", tag)
            }
            ControlError::InvalidModeValue { expected, .. } => {
                format!("허용되지 않는 값입니다. {} 중 하나여야 합니다.", expected)
            }
            ControlError::InvalidTagValue { value, .. } => {
                format!("잘못된 태그 값입니다: {}", value)
            }
            ControlError::NotConfigured => "자동 제어 설정이 구성되지 않았습니다".to_string(),
            ControlError::Disabled => "자동 제어가 비활성화 상태입니다".to_string(),
            ControlError::NoTargets => {
                "제어할 태그가 없거나 모든 제어가 실패했습니다".to_string()
            }
            ControlError::JournalWrite { .. } => "제어 로그 저장에 실패했습니다".to_string(),
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// A Result type with GatewayError.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// A Result type with ConfigError.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// A Result type with ModbusError.
pub type ModbusResult<T> = Result<T, ModbusError>;

/// A Result type with StoreError.
pub type StoreResult<T> = Result<T, StoreError>;

/// A Result type with ControlError.
pub type ControlResult<T> = Result<T, ControlError>;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modbus_error_retryable() {
        assert!(ModbusError::connection_failed("10.0.0.1", 502, "refused").is_retryable());
        assert!(ModbusError::timeout(Duration::from_secs(3)).is_retryable());
        assert!(ModbusError::NotConnected.is_retryable());
        assert!(!ModbusError::read_failed("2000", "exception").is_retryable());
    }

    #[test]
    fn test_status_codes() {
        let err: GatewayError = ModbusError::NotConnected.into();
        assert_eq!(err.status_code(), 503);

        let err: GatewayError = StoreError::machine_not_found("OIL_MAIN").into();
        assert_eq!(err.status_code(), 404);

        let err: GatewayError = StoreError::duplicate_tag("OIL_MAIN", "PV").into();
        assert_eq!(err.status_code(), 409);

        let err: GatewayError = ControlError::tag_read_only("PV").into();
        assert_eq!(err.status_code(), 403);

        let err: GatewayError = ConfigError::invalid_tag_type("Coil").into();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_connection_error_context() {
        let err = ModbusError::connection_failed("172.30.1.97", 502, "connection refused");
        assert!(err.to_string().contains("172.30.1.97:502"));
        assert!(err.user_message().contains("172.30.1.97"));
    }

    #[test]
    fn test_error_type_labels() {
        let err: GatewayError = ConfigError::invalid_permission("rw").into();
        assert_eq!(err.error_type(), "config");
        assert_eq!(ModbusError::NotConnected.error_type(), "not_connected");
    }
}
