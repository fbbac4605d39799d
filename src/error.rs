//! The caller-visible failure taxonomy.
//!
//! Every operation failure the API can surface is one of these variants,
//! mapped to an HTTP status and a JSON body of the form
//! `{"error": "<kind>", "message": "<text>"}`. Unexpected store/hash/token
//! failures collapse into [`AppError::Internal`], which is logged and
//! surfaced as a generic message with no internal detail.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::model::ComplaintStatus;

#[derive(Debug, Error)]
pub enum AppError {
    /// A required field is missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// The referenced record does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Missing, malformed, or expired authorization token.
    #[error("invalid or missing authorization token")]
    Unauthorized,

    /// Login failure. Deliberately undifferentiated: unknown email, inactive
    /// account, and password mismatch all produce this same signal.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("an official with this email already exists")]
    DuplicateEmail,

    #[error("this citizen has already reviewed this complaint")]
    DuplicateReview,

    #[error("cannot transition complaint from '{from}' to '{to}'")]
    InvalidTransition {
        from: ComplaintStatus,
        to: ComplaintStatus,
    },

    #[error("complaint is not yet public for review")]
    NotPublic,

    #[error("no official is assigned to this complaint")]
    NoOfficialAssigned,

    #[error("rating must be an integer between 1 and 5")]
    InvalidRating,

    /// Anything unexpected from the store or the hashing/token libraries.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable kind for the JSON body.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::NotFound(_) => "not_found",
            AppError::Unauthorized => "unauthorized",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::DuplicateEmail => "duplicate_email",
            AppError::DuplicateReview => "duplicate_review",
            AppError::InvalidTransition { .. } => "invalid_transition",
            AppError::NotPublic => "not_public",
            AppError::NoOfficialAssigned => "no_official_assigned",
            AppError::InvalidRating => "invalid_rating",
            AppError::Internal(_) => "internal_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::NotPublic
            | AppError::NoOfficialAssigned
            | AppError::InvalidRating => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::DuplicateEmail
            | AppError::DuplicateReview
            | AppError::InvalidTransition { .. } => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            // Internal causes are logged, never sent to the caller.
            AppError::Internal(e) => {
                error!(error = %e, "internal error");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            error: self.kind(),
            message,
        };

        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_message_names_both_states() {
        let err = AppError::InvalidTransition {
            from: ComplaintStatus::Resolved,
            to: ComplaintStatus::Pending,
        };
        let message = err.to_string();
        assert!(message.contains("resolved"));
        assert!(message.contains("pending"));
    }

    #[test]
    fn test_kinds_are_stable() {
        assert_eq!(AppError::NotPublic.kind(), "not_public");
        assert_eq!(AppError::DuplicateReview.kind(), "duplicate_review");
        assert_eq!(
            AppError::Validation("ward is required".into()).kind(),
            "validation_error"
        );
    }
}
