//! Application error types.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use atlas_core::auth::AuthError;
use atlas_core::store::StoreError;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// JSON error body: machine-readable code plus human-readable message.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    WeakPassword(String),

    #[error("{0}")]
    InvalidEmail(String),

    #[error("{0}")]
    AlreadyExists(String),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("account is inactive")]
    Inactive,

    /// Credential presentation problems (missing or malformed header).
    #[error("{0}")]
    Unauthorized(String),

    #[error("invalid token")]
    TokenInvalid,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token type")]
    InvalidTokenType,

    #[error("{0}")]
    NotFound(String),

    #[error("rate limit exceeded")]
    RateLimited { retry_after_secs: u64 },

    #[error("internal server error")]
    Internal(String),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            Self::InvalidInput(m) => (StatusCode::BAD_REQUEST, "invalid_input", m.clone()),
            Self::WeakPassword(m) => (StatusCode::BAD_REQUEST, "weak_password", m.clone()),
            Self::InvalidEmail(m) => (StatusCode::BAD_REQUEST, "invalid_email", m.clone()),
            Self::AlreadyExists(m) => (StatusCode::CONFLICT, "already_exists", m.clone()),
            Self::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                self.to_string(),
            ),
            Self::Inactive => (StatusCode::FORBIDDEN, "inactive", self.to_string()),
            Self::Unauthorized(m) => (StatusCode::UNAUTHORIZED, "unauthorized", m.clone()),
            Self::TokenInvalid => (StatusCode::UNAUTHORIZED, "token_invalid", self.to_string()),
            Self::TokenExpired => (StatusCode::UNAUTHORIZED, "token_expired", self.to_string()),
            Self::InvalidTokenType => (
                StatusCode::UNAUTHORIZED,
                "invalid_token_type",
                self.to_string(),
            ),
            Self::NotFound(m) => (StatusCode::NOT_FOUND, "not_found", m.clone()),
            Self::RateLimited { retry_after_secs } => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                format!("too many requests, please try again in {retry_after_secs} seconds"),
            ),
            // Detail never reaches the client.
            Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "an unexpected error occurred".to_string(),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Self::Internal(detail) = &self {
            error!(%detail, "internal error");
        }

        let (status, code, message) = self.parts();
        let mut response = (
            status,
            Json(ErrorResponse {
                error: code.to_string(),
                message,
            }),
        )
            .into_response();

        if let Self::RateLimited { retry_after_secs } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }

        response
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidInput(m) => Self::InvalidInput(m),
            AuthError::WeakPassword(m) => Self::WeakPassword(m),
            AuthError::InvalidEmail(m) => Self::InvalidEmail(m),
            AuthError::AlreadyExists => {
                Self::AlreadyExists("user with this email already exists".into())
            }
            AuthError::InvalidCredentials => Self::InvalidCredentials,
            AuthError::Inactive => Self::Inactive,
            AuthError::TokenInvalid => Self::TokenInvalid,
            AuthError::TokenExpired => Self::TokenExpired,
            AuthError::InvalidTokenType => Self::InvalidTokenType,
            AuthError::Store(StoreError::NotFound) => Self::NotFound("user not found".into()),
            AuthError::Store(e) => Self::Internal(e.to_string()),
            AuthError::Internal(m) => Self::Internal(m),
        }
    }
}
