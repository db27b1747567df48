//! Error types for helpline
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (malformed input, unknown entity, bad config)
//! - 3: Blocked (actor lacks permission, or the post's state forbids the action)
//! - 4: Operation failed (storage, lock contention, constraint violation)

use std::path::PathBuf;

use serde_json::json;
use thiserror::Error;

/// Exit codes for the helpline CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const BLOCKED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for helpline operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("No helpline store at {0}")]
    NotInitialized(PathBuf),

    // Blocked by authorization or lifecycle state (exit code 3)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    // Operation failures (exit code 4)
    #[error("Unique constraint violated on {table}: {key}")]
    UniqueViolation { table: &'static str, key: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Error::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Validation(_)
            | Error::InvalidArgument(_)
            | Error::InvalidConfig(_)
            | Error::NotFound { .. }
            | Error::NotInitialized(_) => exit_codes::USER_ERROR,

            Error::Forbidden(_) | Error::InvalidState(_) => exit_codes::BLOCKED,

            Error::UniqueViolation { .. }
            | Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::LockFailed(_)
            | Error::OperationFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Stable machine-readable code, independent of the message text
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation_error",
            Error::InvalidArgument(_) => "invalid_argument",
            Error::InvalidConfig(_) => "invalid_config",
            Error::NotFound { .. } => "not_found",
            Error::NotInitialized(_) => "not_initialized",
            Error::Forbidden(_) => "forbidden",
            Error::InvalidState(_) => "invalid_state",
            Error::UniqueViolation { .. } => "conflict",
            Error::Io(_) => "io_error",
            Error::Json(_) => "json_error",
            Error::TomlParse(_) | Error::TomlSerialize(_) => "toml_error",
            Error::LockFailed(_) => "lock_failed",
            Error::OperationFailed(_) => "operation_failed",
        }
    }

    /// Structured fields for JSON error output
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::NotFound { entity, id } => Some(json!({ "entity": entity, "id": id })),
            Error::UniqueViolation { table, key } => Some(json!({ "table": table, "key": key })),
            Error::LockFailed(path) | Error::NotInitialized(path) => {
                Some(json!({ "path": path.display().to_string() }))
            }
            Error::Validation(message)
            | Error::InvalidArgument(message)
            | Error::InvalidConfig(message)
            | Error::Forbidden(message)
            | Error::InvalidState(message) => Some(json!({ "message": message })),
            _ => None,
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Error::UniqueViolation { .. })
    }
}

/// Result type alias for helpline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: &'static str,
    pub exit_code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.code(),
            exit_code: err.exit_code(),
            details: err.details(),
        }
    }
}
