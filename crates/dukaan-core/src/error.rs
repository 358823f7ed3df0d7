//! # Error Types
//!
//! Domain-specific error types for dukaan-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  dukaan-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  dukaan-db errors (separate crate)                                     │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── LedgerError      - CoreError | DbError, the engine surface        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → LedgerError → caller              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (item name, quantities, ...)
//! 3. Errors are enum variants, never String

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations. They are
/// user-correctable and map to 4xx at any outer surface.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Insufficient stock to fill a line item.
    ///
    /// ## When This Occurs
    /// - A sale line requests more than the item's current `available`
    /// - A quantity update's net delta would drive `available` negative
    ///
    /// The stock guard rejects before any mutation becomes visible, so
    /// `available` is exactly as it was when this error is returned.
    #[error("Insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// A transaction draft is missing required data.
    ///
    /// ## When This Occurs
    /// - Empty `user_id`
    /// - Negative total or paid amount
    /// - A pure payment with nothing paid
    #[error("Invalid transaction data: {reason}")]
    InvalidTransactionData { reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InvalidTransactionData error.
    pub fn invalid_transaction(reason: impl Into<String>) -> Self {
        CoreError::InvalidTransactionData {
            reason: reason.into(),
        }
    }

    /// Creates an InsufficientStock error.
    pub fn insufficient_stock(name: impl Into<String>, available: i64, requested: i64) -> Self {
        CoreError::InsufficientStock {
            name: name.into(),
            available,
            requested,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before business logic runs.
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

    /// Invalid format (e.g., invalid phone number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., a second product with the same name, color
    /// and variant).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },

    /// An update was requested with no fields set.
    #[error("no fields provided for update")]
    EmptyUpdate,
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
    fn test_insufficient_stock_message() {
        let err = CoreError::insufficient_stock("Galaxy A16 Black 128GB", 3, 5);
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Galaxy A16 Black 128GB: available 3, requested 5"
        );
    }

    #[test]
    fn test_invalid_transaction_message() {
        let err = CoreError::invalid_transaction("user_id is required");
        assert_eq!(
            err.to_string(),
            "Invalid transaction data: user_id is required"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
