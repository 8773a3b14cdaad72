//! # API Error Type
//!
//! The error every `Bookkeeper` operation returns.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Tally                                  │
//! │                                                                         │
//! │  UI                          Rust Backend                               │
//! │  ──                          ────────────                               │
//! │                                                                         │
//! │  bookkeeper.deduct_bonus(&session, amount)                              │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Operation                                                       │  │
//! │  │  ApiResult<T>                                                    │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Store Error? ─── DbError::Conflict { .. } ─────────┐           │  │
//! │  │         │                                           │           │  │
//! │  │         ▼                                           ▼           │  │
//! │  │  Rule Error? ─── CoreError::PermissionDenied ──── ApiError ────►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  { "code": "INSUFFICIENT_BALANCE",                                      │
//! │    "message": "Insufficient bonus pool balance: ..." }                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Store internals (SQL text, pool state) are logged, never shown.

use serde::Serialize;
use std::path::PathBuf;
use tally_core::CoreError;
use tally_db::DbError;
use thiserror::Error;

/// Error returned from bookkeeping operations.
///
/// ## Serialization
/// ```json
/// {
///   "code": "PERMISSION_DENIED",
///   "message": "Role employee may not create withdrawal"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Record not found
    NotFound,

    /// Caller's role may not perform the operation
    PermissionDenied,

    /// Input validation failed
    ValidationError,

    /// Bonus deduction larger than the pool
    InsufficientBalance,

    /// Lost an optimistic concurrency race too many times
    Conflict,

    /// Store operation failed
    DatabaseError,

    /// Anything else
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts store errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::Conflict { entity, .. } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} changed while saving, please try again", entity),
            ),
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts rule errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::PermissionDenied { .. } => {
                ApiError::new(ErrorCode::PermissionDenied, err.to_string())
            }
            CoreError::InsufficientBonusBalance { .. } => {
                ApiError::new(ErrorCode::InsufficientBalance, err.to_string())
            }
            CoreError::NotFound { entity, id } => ApiError::not_found(entity, &id),
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

impl From<tally_core::ValidationError> for ApiError {
    fn from(err: tally_core::ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for bookkeeping operations.
pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// Config Error
// =============================================================================

/// Errors loading `tally.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::{Money, Role, ValidationError};

    #[test]
    fn test_core_errors_keep_their_message() {
        let err: ApiError = CoreError::PermissionDenied {
            action: "create withdrawal".to_string(),
            role: Role::Employee,
        }
        .into();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
        assert_eq!(err.message, "Role employee may not create withdrawal");

        let err: ApiError = CoreError::InsufficientBonusBalance {
            requested: Money::from_yuan(500),
            available: Money::from_yuan(300),
        }
        .into();
        assert_eq!(err.code, ErrorCode::InsufficientBalance);
        assert!(err.message.contains("¥300.00"));
    }

    #[test]
    fn test_store_internals_are_hidden() {
        let err: ApiError = DbError::QueryFailed("near \"SELEC\": syntax error".into()).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert_eq!(err.message, "Database operation failed");
    }

    #[test]
    fn test_duplicates_and_conflicts() {
        let err: ApiError = DbError::duplicate("username", "zhangsan").into();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "username 'zhangsan' already exists");

        let err: ApiError = DbError::conflict("bonus_deductions", 3).into();
        assert_eq!(err.code, ErrorCode::Conflict);
    }

    #[test]
    fn test_validation_error_maps_directly() {
        let err: ApiError = ValidationError::MustBePositive {
            field: "amount".to_string(),
        }
        .into();
        assert_eq!(err, ApiError::validation("amount must be positive"));
    }

    #[test]
    fn test_serialized_shape() {
        let err = ApiError::not_found("Transaction", "t-1");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Transaction not found: t-1");
        assert_eq!(err.to_string(), "[NotFound] Transaction not found: t-1");
    }
}
