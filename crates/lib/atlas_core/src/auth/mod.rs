//! Authentication domain logic.
//!
//! Password hashing, token issuance/validation, and the credential service
//! shared by the HTTP boundary and the server binary.

pub mod password;
pub mod service;
pub mod token;

use thiserror::Error;

use crate::store::StoreError;

/// Credential-lifecycle errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    WeakPassword(String),

    #[error("{0}")]
    InvalidEmail(String),

    #[error("user with this email already exists")]
    AlreadyExists,

    /// Unknown user and wrong password collapse into this one variant so
    /// callers cannot probe which emails are registered.
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("account is inactive")]
    Inactive,

    #[error("invalid token")]
    TokenInvalid,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token type")]
    InvalidTokenType,

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}
