//! Credential service — registration, login, refresh, identity lookup.
//!
//! Orchestrates the password and token engines over the external user store.
//! Everything here is stateless apart from the injected collaborators, so
//! calls are safely concurrent.

use std::sync::{Arc, LazyLock};
use std::time::Duration as StdDuration;

use chrono::{Datelike, Duration, NaiveDate};
use regex::Regex;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthError;
use crate::auth::password::{hash_password, validate_strength, verify_password};
use crate::auth::token::{TokenClaims, TokenKind, issue_token, validate_token};
use crate::clock::Clock;
use crate::models::{Registration, User, UserRecord};
use crate::store::{StoreError, UserStore};

/// Minimum age to open an account.
const MIN_AGE_YEARS: i32 = 18;

/// Upper bound on mailbox length per RFC 5321.
const MAX_EMAIL_LEN: usize = 254;

/// Mailbox shape: local part, `@`, domain with at least one dot, no
/// whitespace anywhere.
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex"));

/// Tokens and user returned by a successful login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: User,
}

/// New access token returned by a refresh.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Orchestrates the credential lifecycle.
pub struct AuthService {
    store: Arc<dyn UserStore>,
    clock: Arc<dyn Clock>,
    jwt_secret: String,
    bcrypt_cost: u32,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn UserStore>,
        clock: Arc<dyn Clock>,
        jwt_secret: impl Into<String>,
        bcrypt_cost: u32,
        access_ttl: StdDuration,
        refresh_ttl: StdDuration,
    ) -> Self {
        Self {
            store,
            clock,
            jwt_secret: jwt_secret.into(),
            bcrypt_cost,
            access_ttl: Duration::from_std(access_ttl).unwrap_or_else(|_| Duration::minutes(15)),
            refresh_ttl: Duration::from_std(refresh_ttl).unwrap_or_else(|_| Duration::days(7)),
        }
    }

    /// Create a new account and return it without credential material.
    pub async fn register(&self, reg: Registration) -> Result<User, AuthError> {
        let date_of_birth = validate_required(&reg)?;
        let now = self.clock.now();
        validate_age(date_of_birth, now.date_naive())?;

        let email = reg.email.trim().to_lowercase();
        validate_email(&email)?;
        validate_strength(&reg.password)?;

        match self.store.get_by_email(&email).await {
            Ok(_) => return Err(AuthError::AlreadyExists),
            Err(StoreError::NotFound) => {}
            Err(e) => return Err(e.into()),
        }

        let password_hash = hash_password(&reg.password, self.bcrypt_cost)?;

        let record = UserRecord {
            user: User {
                id: Uuid::new_v4(),
                email,
                phone: reg.phone.trim().to_string(),
                first_name: reg.first_name,
                last_name: reg.last_name,
                date_of_birth,
                address_line1: reg.address_line1,
                address_line2: reg.address_line2,
                city: reg.city,
                postcode: reg.postcode,
                country: reg.country,
                kyc_status: "pending".to_string(),
                kyc_verified_at: None,
                is_active: true,
                created_at: now,
                updated_at: now,
            },
            password_hash,
        };

        match self.store.create(&record).await {
            Ok(()) => {}
            // Concurrent registration can slip past the pre-check; the
            // store's uniqueness constraint reports it late. Same outcome.
            Err(StoreError::UniqueViolation) => return Err(AuthError::AlreadyExists),
            Err(e) => return Err(e.into()),
        }

        info!(user_id = %record.user.id, "registered new user");
        Ok(record.user)
    }

    /// Authenticate with email + password, issuing an access/refresh pair.
    ///
    /// Unknown user and wrong password are deliberately the same error.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AuthError> {
        if email.trim().is_empty() {
            return Err(AuthError::InvalidInput("email is required".into()));
        }
        if password.is_empty() {
            return Err(AuthError::InvalidInput("password is required".into()));
        }

        let normalized = email.trim().to_lowercase();
        let record = match self.store.get_by_email(&normalized).await {
            Ok(record) => record,
            Err(StoreError::NotFound) => return Err(AuthError::InvalidCredentials),
            Err(e) => return Err(e.into()),
        };

        if !record.user.is_active {
            return Err(AuthError::Inactive);
        }

        if !verify_password(password, &record.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let now = self.clock.now();
        let subject = record.user.id.to_string();
        let access_token = issue_token(
            &subject,
            &record.user.email,
            TokenKind::Access,
            self.access_ttl,
            self.jwt_secret.as_bytes(),
            now,
        )?;
        let refresh_token = issue_token(
            &subject,
            &record.user.email,
            TokenKind::Refresh,
            self.refresh_ttl,
            self.jwt_secret.as_bytes(),
            now,
        )?;

        info!(user_id = %record.user.id, "user logged in");
        Ok(LoginResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_ttl.num_seconds(),
            user: record.user,
        })
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// The presented refresh token is not rotated and stays valid until its
    /// natural expiry.
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, AuthError> {
        if refresh_token.is_empty() {
            return Err(AuthError::InvalidInput("refresh token is required".into()));
        }

        let claims = self.check_token(refresh_token, TokenKind::Refresh)?;
        let record = self.load_subject(&claims).await?;

        let access_token = issue_token(
            &record.user.id.to_string(),
            &record.user.email,
            TokenKind::Access,
            self.access_ttl,
            self.jwt_secret.as_bytes(),
            self.clock.now(),
        )?;

        Ok(RefreshResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_ttl.num_seconds(),
        })
    }

    /// Resolve an access token to its (still active) subject.
    pub async fn validate_access_token(&self, access_token: &str) -> Result<User, AuthError> {
        if access_token.is_empty() {
            return Err(AuthError::InvalidInput("access token is required".into()));
        }

        let claims = self.check_token(access_token, TokenKind::Access)?;
        let record = self.load_subject(&claims).await?;
        Ok(record.user)
    }

    fn check_token(&self, token: &str, expected: TokenKind) -> Result<TokenClaims, AuthError> {
        let claims = validate_token(token, self.jwt_secret.as_bytes(), self.clock.now())?;
        if claims.token_type != expected {
            return Err(AuthError::InvalidTokenType);
        }
        Ok(claims)
    }

    /// Re-load the token's subject so accounts deactivated since issuance
    /// are caught.
    async fn load_subject(&self, claims: &TokenClaims) -> Result<UserRecord, AuthError> {
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::TokenInvalid)?;
        let record = self.store.get_by_id(user_id).await?;
        if !record.user.is_active {
            return Err(AuthError::Inactive);
        }
        Ok(record)
    }
}

fn validate_required(reg: &Registration) -> Result<NaiveDate, AuthError> {
    fn require(value: &str, field: &str) -> Result<(), AuthError> {
        if value.trim().is_empty() {
            return Err(AuthError::InvalidInput(format!("{field} is required")));
        }
        Ok(())
    }

    require(&reg.email, "email")?;
    if reg.password.is_empty() {
        return Err(AuthError::InvalidInput("password is required".into()));
    }
    require(&reg.phone, "phone")?;
    require(&reg.first_name, "first name")?;
    require(&reg.last_name, "last name")?;
    let date_of_birth = reg
        .date_of_birth
        .ok_or_else(|| AuthError::InvalidInput("date of birth is required".into()))?;
    require(&reg.address_line1, "address line 1")?;
    require(&reg.city, "city")?;
    require(&reg.postcode, "postcode")?;
    require(&reg.country, "country")?;
    Ok(date_of_birth)
}

/// Whole years at `today`, by year difference with a day-of-year correction.
fn validate_age(date_of_birth: NaiveDate, today: NaiveDate) -> Result<(), AuthError> {
    let mut age = today.year() - date_of_birth.year();
    if today.ordinal() < date_of_birth.ordinal() {
        age -= 1;
    }
    if age < MIN_AGE_YEARS {
        return Err(AuthError::InvalidInput(
            "you must be at least 18 years old to register".into(),
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), AuthError> {
    if email.is_empty() {
        return Err(AuthError::InvalidEmail("email cannot be empty".into()));
    }
    if email.len() > MAX_EMAIL_LEN {
        return Err(AuthError::InvalidEmail("email too long".into()));
    }
    if !EMAIL_RE.is_match(email) {
        return Err(AuthError::InvalidEmail("invalid email format".into()));
    }
    Ok(())
}
