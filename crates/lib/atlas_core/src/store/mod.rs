//! User-record storage.
//!
//! The credential service only ever sees the [`UserStore`] trait; the
//! Postgres adapter and the in-memory store both live behind it. The
//! contract is deliberately narrow — create and two lookups — because that
//! is all the credential lifecycle needs.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::UserRecord;

/// Storage failures, kept distinct so callers can branch on them.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user not found")]
    NotFound,

    /// The store's own uniqueness constraint fired, e.g. when two
    /// registrations for one email race past the pre-check.
    #[error("unique constraint violated")]
    UniqueViolation,

    #[error("store call timed out")]
    Timeout,

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Narrow CRUD contract the credential service needs from user storage.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persist a new user. Fails with [`StoreError::UniqueViolation`] when
    /// the email is already taken.
    async fn create(&self, record: &UserRecord) -> Result<(), StoreError>;

    /// Load a user by ID.
    async fn get_by_id(&self, id: Uuid) -> Result<UserRecord, StoreError>;

    /// Load a user by (normalized) email.
    async fn get_by_email(&self, email: &str) -> Result<UserRecord, StoreError>;
}
