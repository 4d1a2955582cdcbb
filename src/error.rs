//! Service error types with HTTP status code mapping.
//!
//! [`EngagementError`] is the central error type for the service. Each
//! variant maps to a specific HTTP status code and structured JSON error
//! response. Ownership failures are reported as [`EngagementError::NotFound`]
//! so that the existence of another owner's follow-up is never leaked.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape (`details` is omitted when empty):
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "follow-up not found"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see the table on [`EngagementError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Service-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                  |
/// |-----------|-----------------|------------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request / 401        |
/// | 2000–2999 | State/Not Found | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server          | 500 Internal Server Error    |
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngagementError {
    /// The resource is absent, unpublished, or not owned by the caller.
    #[error("{resource} not found")]
    NotFound {
        /// Human-readable resource name (e.g. `"follow-up"`).
        resource: &'static str,
    },

    /// Request validation failed before reaching the store.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The store rejected a write because of a uniqueness constraint.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The caller did not present an owner identity.
    #[error("authentication required")]
    Unauthorized,

    /// Unclassified persistence failure.
    #[error("store error: {0}")]
    Store(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EngagementError {
    /// Shorthand for a [`EngagementError::NotFound`] on a follow-up.
    #[must_use]
    pub const fn followup_not_found() -> Self {
        Self::NotFound {
            resource: "follow-up",
        }
    }

    /// Shorthand for a [`EngagementError::NotFound`] on a session.
    #[must_use]
    pub const fn session_not_found() -> Self {
        Self::NotFound {
            resource: "session",
        }
    }

    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation(_) => 1001,
            Self::Unauthorized => 1002,
            Self::NotFound { .. } => 2001,
            Self::Conflict(_) => 2002,
            Self::Internal(_) => 3000,
            Self::Store(_) => 3001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for EngagementError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::Conflict(db.message().to_string())
            }
            _ => Self::Store(err.to_string()),
        }
    }
}

impl IntoResponse for EngagementError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
