//! Error responses.
//!
//! Every failure leaves the API as `{ "error": <code>, "message": <text> }`.
//! Ledger errors keep their own codes (`LIMIT_EXCEEDED`,
//! `INSUFFICIENT_BALANCE`, ...); storage failures are logged and hidden.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{error, warn};

use pettycash_core::LedgerError;
use pettycash_shared::AppError;

/// An error that can be returned from a handler.
#[derive(Debug)]
pub enum ApiError {
    /// Application-wide error (auth, scope, config).
    App(AppError),
    /// Ledger or workflow error from a repository.
    Ledger(LedgerError),
}

impl ApiError {
    /// HTTP status of the response.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        let code = match self {
            Self::App(e) => e.status_code(),
            Self::Ledger(e) => e.http_status_code(),
        };
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Shorthand for a 403 on another company's data.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::App(AppError::Forbidden(message.into()))
    }

    /// Shorthand for a 400.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::App(AppError::Validation(message.into()))
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self::App(err)
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        Self::Ledger(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::App(e) => e.to_body(),
            Self::Ledger(LedgerError::Database(detail)) => {
                error!(error = %detail, "Ledger storage failure");
                json!({
                    "error": "DATABASE_ERROR",
                    "message": "An internal error occurred",
                })
            }
            Self::Ledger(e) => json!({
                "error": e.error_code(),
                "message": e.to_string(),
            }),
        };

        if let Self::App(e) = &self {
            if status.is_server_error() {
                error!(error = %e, "Request failed");
            } else {
                warn!(error = %e, "Request rejected");
            }
        }

        (status, Json(body)).into_response()
    }
}
