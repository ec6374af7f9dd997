//! User domain models.
//!
//! [`User`] is the public shape handed back to callers and serialized onto
//! the wire; [`UserRecord`] additionally carries the password hash and only
//! ever travels between the credential service and the store.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Public user record. Carries no credential material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Normalized (trimmed, lowercased) unique email.
    pub email: String,
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub postcode: String,
    pub country: String,
    /// KYC verification status, `"pending"` until verified.
    pub kyc_status: String,
    pub kyc_verified_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User plus password hash — the only shape the store sees.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user: User,
    pub password_hash: String,
}

/// Registration input. The plaintext password never outlives the call.
///
/// All fields default to empty/absent so that missing-field errors come out
/// of the credential service's own validation, one field at a time.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Registration {
    pub email: String,
    pub phone: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub postcode: String,
    pub country: String,
}
