//! API error handling
//!
//! Every handler returns `Result<_, ApiError>`. Domain and database errors
//! convert into it, and the response body always carries a readable
//! `message`; validation failures add the per-field `fields` map.

use axum::{
    extract::multipart::MultipartError,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use core_kernel::FieldErrors;
use domain_account::AccountError;
use domain_group::GroupError;
use domain_listing::ListingError;
use domain_messaging::MessagingError;
use domain_review::ReviewError;
use infra_db::DatabaseError;

use crate::auth::AuthError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(FieldErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    /// A 400 with a single non-field message
    pub fn invalid(message: impl Into<String>) -> Self {
        ApiError::Validation(FieldErrors::non_field(message))
    }

    pub fn not_found(what: &str) -> Self {
        ApiError::NotFound(format!("{} not found.", what))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_type = match &self {
            ApiError::Validation(_) => "validation_error",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::Internal(_) => "internal_error",
        };

        let body = match self {
            ApiError::Validation(fields) => ErrorResponse {
                error: error_type.to_string(),
                message: fields.to_string(),
                fields: Some(fields),
            },
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "Internal error");
                ErrorResponse {
                    error: error_type.to_string(),
                    message: "An unexpected error occurred.".to_string(),
                    fields: None,
                }
            }
            other => ErrorResponse {
                error: error_type.to_string(),
                message: other.to_string(),
                fields: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => ApiError::NotFound(msg),
            DatabaseError::DuplicateEntry(msg) => ApiError::Conflict(msg),
            DatabaseError::ForeignKeyViolation(msg) | DatabaseError::ConstraintViolation(msg) => {
                ApiError::BadRequest(msg)
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Encoding(msg) => ApiError::Internal(msg),
            other => ApiError::Unauthorized(other.to_string()),
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Validation(fields) => ApiError::Validation(fields),
            AccountError::InvalidCredentials | AccountError::RoommateProfileExists => ApiError::invalid(err.to_string()),
            AccountError::EmailNotVerified => ApiError::Unauthorized(err.to_string()),
            AccountError::RoommateProfileMissing => ApiError::NotFound(err.to_string()),
            AccountError::PasswordHash(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<ListingError> for ApiError {
    fn from(err: ListingError) -> Self {
        match err {
            ListingError::Validation(fields) => ApiError::Validation(fields),
            ListingError::NotFound => ApiError::not_found("Listing"),
        }
    }
}

impl From<GroupError> for ApiError {
    fn from(err: GroupError) -> Self {
        match err {
            GroupError::Validation(fields) => ApiError::Validation(fields),
            GroupError::NotFound => ApiError::not_found("Group"),
            GroupError::InvalidStatus(msg) => ApiError::Validation(FieldErrors::single("group_status", msg)),
            GroupError::PermissionDenied(msg) => ApiError::Forbidden(msg),
            other => ApiError::invalid(other.to_string()),
        }
    }
}

impl From<MessagingError> for ApiError {
    fn from(err: MessagingError) -> Self {
        match err {
            MessagingError::Validation(fields) => ApiError::Validation(fields),
            MessagingError::NotFound => ApiError::not_found("Conversation"),
            MessagingError::OtherParticipantsRemain => ApiError::Forbidden(err.to_string()),
            other => ApiError::invalid(other.to_string()),
        }
    }
}

impl From<ReviewError> for ApiError {
    fn from(err: ReviewError) -> Self {
        match err {
            ReviewError::Validation(fields) => ApiError::Validation(fields),
            ReviewError::NotReviewer => ApiError::Forbidden(err.to_string()),
            other => ApiError::invalid(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Internal(format!("storage: {}", err))
    }
}
