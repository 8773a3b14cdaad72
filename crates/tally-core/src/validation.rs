//! # Validation Module
//!
//! Input validation for every record the service writes.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: UI form                                                      │
//! │  ├── Basic format checks (empty, number parsing)                       │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: tally-service (Rust)                                         │
//! │  ├── Session role check                                                │
//! │  └── THIS MODULE: field rules                                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Record Store (SQLite)                                        │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── UNIQUE constraints (username, one binding per customer)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::money::Money;
//! use tally_core::validation::{validate_name, validate_positive_amount};
//!
//! let name = validate_name("customer_name", "  Li Si ").unwrap();
//! assert_eq!(name, "Li Si");
//!
//! assert!(validate_positive_amount("amount", Money::zero()).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::quantity::Quantity;
use crate::types::{NewEmployee, NewTransaction, Transaction};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest name accepted for people, customers and products.
pub const MAX_NAME_LEN: usize = 100;

/// Longest free-text note on a transfer or withdrawal.
pub const MAX_NOTE_LEN: usize = 500;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a display name (customer, collector, product, employee).
///
/// ## Rules
/// - Must not be blank
/// - At most [`MAX_NAME_LEN`] characters
///
/// ## Returns
/// The trimmed name.
pub fn validate_name(field: &str, value: &str) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(value.to_string())
}

/// Validates a login name.
///
/// ## Rules
/// - 3 to 32 characters
/// - Letters, digits, `_`, `-` and `.` only
///
/// ## Example
/// ```rust
/// use tally_core::validation::validate_username;
///
/// assert!(validate_username("zhang.san").is_ok());
/// assert!(validate_username("ab").is_err());
/// assert!(validate_username("has space").is_err());
/// ```
pub fn validate_username(username: &str) -> ValidationResult<String> {
    let username = username.trim();

    if username.is_empty() {
        return Err(ValidationError::Required {
            field: "username".to_string(),
        });
    }

    let len = username.chars().count();
    if !(3..=32).contains(&len) {
        return Err(ValidationError::OutOfRange {
            field: "username length".to_string(),
            min: 3,
            max: 32,
        });
    }

    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must contain only letters, numbers, '_', '-' and '.'".to_string(),
        });
    }

    Ok(username.to_string())
}

/// Validates an optional note. Blank notes become `None`.
pub fn validate_note(note: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(note) = note.map(str::trim).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };

    if note.chars().count() > MAX_NOTE_LEN {
        return Err(ValidationError::TooLong {
            field: "note".to_string(),
            max: MAX_NOTE_LEN,
        });
    }

    Ok(Some(note.to_string()))
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a transfer, withdrawal or deduction amount.
///
/// ## Rules
/// - Must be positive (> 0)
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Bonus Pool: Deduct                                                     │
/// │                                                                         │
/// │  Merchant enters amount: 0                                             │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_positive_amount("amount", ¥0.00) ← THIS FUNCTION             │
/// │       │                                                                 │
/// │       ├── amount <= 0? → Error: "amount must be positive"              │
/// │       │                                                                 │
/// │       └── OK → compare against current pool balance                    │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_positive_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates that a money field is zero or more.
pub fn validate_non_negative_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates that a quantity field is zero or more.
pub fn validate_non_negative_quantity(field: &str, quantity: Quantity) -> ValidationResult<()> {
    if quantity.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Record Validators
// =============================================================================

/// Validates and normalizes a new transaction.
///
/// ## Rules
/// - `customer_name` and `collector` are required names
/// - `product_name`, when present, is a valid name (blank means none)
/// - `quantity`, `gift_quantity`, `unit_price` and `total_amount` are
///   never negative
pub fn validate_new_transaction(new: &NewTransaction) -> ValidationResult<NewTransaction> {
    let product_name = match new.product_name.as_deref().map(str::trim) {
        Some(p) if !p.is_empty() => Some(validate_name("product_name", p)?),
        _ => None,
    };

    validate_non_negative_quantity("quantity", new.quantity)?;
    validate_non_negative_quantity("gift_quantity", new.gift_quantity)?;
    validate_non_negative_amount("unit_price", new.unit_price)?;
    validate_non_negative_amount("total_amount", new.total_amount)?;

    Ok(NewTransaction {
        transaction_type: new.transaction_type,
        customer_name: validate_name("customer_name", &new.customer_name)?,
        product_name,
        collector: validate_name("collector", &new.collector)?,
        quantity: new.quantity,
        gift_quantity: new.gift_quantity,
        unit_price: new.unit_price,
        total_amount: new.total_amount,
    })
}

/// Re-checks a transaction after an edit has been applied.
pub fn validate_transaction(tx: &Transaction) -> ValidationResult<()> {
    validate_name("customer_name", &tx.customer_name)?;
    validate_name("collector", &tx.collector)?;
    if let Some(product) = &tx.product_name {
        validate_name("product_name", product)?;
    }
    validate_non_negative_quantity("quantity", tx.quantity)?;
    validate_non_negative_quantity("gift_quantity", tx.gift_quantity)?;
    validate_non_negative_amount("unit_price", tx.unit_price)?;
    validate_non_negative_amount("total_amount", tx.total_amount)?;
    Ok(())
}

/// Validates and normalizes a new employee.
pub fn validate_new_employee(new: &NewEmployee) -> ValidationResult<NewEmployee> {
    Ok(NewEmployee {
        name: validate_name("name", &new.name)?,
        username: validate_username(&new.username)?,
        role: new.role,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
