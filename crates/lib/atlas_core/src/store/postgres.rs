//! Postgres-backed user store.
//!
//! Expects a `users` table with one column per [`crate::models::User`] field
//! plus `password_hash`, and a unique index on `email`. Every call is
//! bounded by a timeout so a wedged database surfaces as
//! [`StoreError::Timeout`] instead of hanging the admission path.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{StoreError, UserStore};
use crate::models::{User, UserRecord};

/// Default bound on any single store call.
const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

const USER_COLUMNS: &str = "id, email, phone, password_hash, first_name, last_name, \
     date_of_birth, address_line1, address_line2, city, postcode, country, \
     kyc_status, kyc_verified_at, is_active, created_at, updated_at";

/// sqlx adapter over the `users` table.
pub struct PgUserStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self::with_timeout(pool, DEFAULT_QUERY_TIMEOUT)
    }

    pub fn with_timeout(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, sqlx::Error>>,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(map_sqlx_error),
            Err(_) => Err(StoreError::Timeout),
        }
    }
}

fn map_sqlx_error(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::UniqueViolation,
        _ => StoreError::Backend(e.to_string()),
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    phone: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    date_of_birth: NaiveDate,
    address_line1: String,
    address_line2: Option<String>,
    city: String,
    postcode: String,
    country: String,
    kyc_status: String,
    kyc_verified_at: Option<DateTime<Utc>>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        UserRecord {
            user: User {
                id: row.id,
                email: row.email,
                phone: row.phone,
                first_name: row.first_name,
                last_name: row.last_name,
                date_of_birth: row.date_of_birth,
                address_line1: row.address_line1,
                address_line2: row.address_line2,
                city: row.city,
                postcode: row.postcode,
                country: row.country,
                kyc_status: row.kyc_status,
                kyc_verified_at: row.kyc_verified_at,
                is_active: row.is_active,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            password_hash: row.password_hash,
        }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, record: &UserRecord) -> Result<(), StoreError> {
        let user = &record.user;
        let query = sqlx::query(
            "INSERT INTO users (id, email, phone, password_hash, first_name, last_name, \
             date_of_birth, address_line1, address_line2, city, postcode, country, \
             kyc_status, kyc_verified_at, is_active, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&record.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.date_of_birth)
        .bind(&user.address_line1)
        .bind(&user.address_line2)
        .bind(&user.city)
        .bind(&user.postcode)
        .bind(&user.country)
        .bind(&user.kyc_status)
        .bind(user.kyc_verified_at)
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool);

        self.bounded(query).await?;
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<UserRecord, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let query = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_one(&self.pool);

        Ok(self.bounded(query).await?.into())
    }

    async fn get_by_email(&self, email: &str) -> Result<UserRecord, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let query = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_one(&self.pool);

        Ok(self.bounded(query).await?.into())
    }
}
