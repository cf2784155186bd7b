//! Ledger error types.
//!
//! One taxonomy for the whole petty-cash core: lookups, spending policy,
//! balance sufficiency, duplicates, state transitions and storage failures.
//! Repositories return these unchanged; only the HTTP layer turns them into
//! responses.

use pettycash_shared::AppError;
use thiserror::Error;

/// Errors that can occur during ledger and workflow operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Referenced entity (balance row, branch, voucher, invoice...) is missing.
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Kind of entity, e.g. "saldo".
        entity: &'static str,
        /// The key that was looked up.
        key: String,
    },

    /// Voucher total is above the branch voucher limit.
    #[error("not allowed more than limit: {limit} (requested {total})")]
    LimitExceeded {
        /// Requested voucher total.
        total: i64,
        /// Configured voucher limit.
        limit: i64,
    },

    /// Debit would drive the closing balance below zero.
    #[error("not enough saldo: available {available}, requested {requested}")]
    InsufficientBalance {
        /// Balance that could be spent.
        available: i64,
        /// Amount that was asked for.
        requested: i64,
    },

    /// Duplicate natural key.
    #[error("{entity} already exists: {key}")]
    AlreadyExists {
        /// Kind of entity.
        entity: &'static str,
        /// The duplicated key.
        key: String,
    },

    /// Status change not allowed by the document's state machine.
    #[error("invalid {entity} transition from {from} to {to}")]
    InvalidTransition {
        /// Kind of document, e.g. "voucher approval".
        entity: &'static str,
        /// Current state.
        from: String,
        /// Requested state.
        to: String,
    },

    /// Malformed input (empty lines, negative amounts, bad month...).
    #[error("{0}")]
    Validation(String),

    /// Storage failure.
    #[error("Database error: {0}")]
    Database(String),
}

impl LedgerError {
    /// Shorthand for [`LedgerError::NotFound`].
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Shorthand for [`LedgerError::AlreadyExists`].
    pub fn already_exists(entity: &'static str, key: impl ToString) -> Self {
        Self::AlreadyExists {
            entity,
            key: key.to_string(),
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::LimitExceeded { .. } => "LIMIT_EXCEEDED",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::AlreadyExists { .. } => "ALREADY_EXISTS",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidTransition { .. } | Self::Validation(_) => 400,
            Self::NotFound { .. } => 404,
            Self::AlreadyExists { .. } => 409,
            Self::LimitExceeded { .. } | Self::InsufficientBalance { .. } => 422,
            Self::Database(_) => 500,
        }
    }

    /// True for business-rule failures, as opposed to bad input or storage.
    #[must_use]
    pub const fn is_business_rule(&self) -> bool {
        matches!(
            self,
            Self::LimitExceeded { .. } | Self::InsufficientBalance { .. }
        )
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err {
            LedgerError::NotFound { .. } => Self::NotFound(message),
            LedgerError::LimitExceeded { .. } | LedgerError::InsufficientBalance { .. } => {
                Self::BusinessRule(message)
            }
            LedgerError::AlreadyExists { .. } => Self::Conflict(message),
            LedgerError::InvalidTransition { .. } | LedgerError::Validation(_) => {
                Self::Validation(message)
            }
            LedgerError::Database(_) => Self::Database(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(LedgerError::not_found("saldo", "x").error_code(), "NOT_FOUND");
        assert_eq!(
            LedgerError::LimitExceeded {
                total: 9000,
                limit: 8000
            }
            .error_code(),
            "LIMIT_EXCEEDED"
        );
        assert_eq!(
            LedgerError::InsufficientBalance {
                available: 1,
                requested: 2
            }
            .error_code(),
            "INSUFFICIENT_BALANCE"
        );
        assert_eq!(
            LedgerError::already_exists("tarik dana", "x").error_code(),
            "ALREADY_EXISTS"
        );
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(LedgerError::not_found("branch", "x").http_status_code(), 404);
        assert_eq!(
            LedgerError::LimitExceeded { total: 2, limit: 1 }.http_status_code(),
            422
        );
        assert_eq!(
            LedgerError::already_exists("saldo", "x").http_status_code(),
            409
        );
        assert_eq!(LedgerError::Validation("x".into()).http_status_code(), 400);
        assert_eq!(LedgerError::Database("x".into()).http_status_code(), 500);
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::LimitExceeded {
            total: 9000,
            limit: 8000,
        };
        assert_eq!(
            err.to_string(),
            "not allowed more than limit: 8000 (requested 9000)"
        );
        assert_eq!(
            LedgerError::not_found("voucher", "BKKJKT0001").to_string(),
            "voucher not found: BKKJKT0001"
        );
    }

    #[test]
    fn test_business_rule_classification() {
        assert!(LedgerError::LimitExceeded { total: 2, limit: 1 }.is_business_rule());
        assert!(!LedgerError::Validation("x".into()).is_business_rule());
        assert!(!LedgerError::Database("x".into()).is_business_rule());
    }

    #[test]
    fn test_into_app_error() {
        let app: AppError = LedgerError::InsufficientBalance {
            available: 8000,
            requested: 9000,
        }
        .into();
        assert_eq!(app.status_code(), 422);
        assert_eq!(app.error_code(), "BUSINESS_RULE_VIOLATION");

        let app: AppError = LedgerError::already_exists("saldo", "jkt").into();
        assert_eq!(app.status_code(), 409);
    }
}
