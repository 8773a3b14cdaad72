//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tally-db errors (separate crate)                                      │
//! │  └── DbError          - Record Store failures                          │
//! │                                                                         │
//! │  tally-service errors                                                  │
//! │  └── ApiError         - What the UI sees (serialized)                  │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError ← DbError                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (amounts, roles, field names)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

use crate::money::Money;
use crate::session::Role;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule errors.
///
/// Raised by the engines and the session checks. None of these are retried;
/// they go straight back to the caller with a readable message.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The caller's role may not perform a mutating operation.
    ///
    /// ## When This Occurs
    /// - An `employee` tries to record a transfer, withdrawal or deduction
    /// - An `employee` tries to edit a transaction or bind a customer
    ///
    /// ## User Workflow
    /// ```text
    /// Employee clicks "Withdraw"
    ///      │
    ///      ▼
    /// session.require_privileged("create withdrawal")
    ///      │
    ///      ▼
    /// PermissionDenied { action: "create withdrawal", role: Employee }
    ///      │
    ///      ▼
    /// UI shows: "Role employee may not create withdrawal"
    /// ```
    #[error("Role {role} may not {action}")]
    PermissionDenied { action: String, role: Role },

    /// A bonus deduction is larger than what the pool currently holds.
    ///
    /// ## When This Occurs
    /// - `amount > currentBalance` at the moment of the request
    /// - Another deduction landed between reading the balance and writing
    ///   (detected on retry)
    #[error("Insufficient bonus pool balance: requested {requested}, available {available}")]
    InsufficientBonusBalance { requested: Money, available: Money },

    /// A referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before any record is written.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or more.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., unparsable quantity, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., username already taken).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientBonusBalance {
            requested: Money::from_yuan(500),
            available: Money::from_yuan(300),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient bonus pool balance: requested ¥500.00, available ¥300.00"
        );

        let err = CoreError::PermissionDenied {
            action: "create withdrawal".to_string(),
            role: Role::Employee,
        };
        assert_eq!(err.to_string(), "Role employee may not create withdrawal");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "customer_name".to_string(),
        };
        assert_eq!(err.to_string(), "customer_name is required");

        let err = ValidationError::MustNotBeNegative {
            field: "gift_quantity".to_string(),
        };
        assert_eq!(err.to_string(), "gift_quantity must not be negative");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "amount".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
