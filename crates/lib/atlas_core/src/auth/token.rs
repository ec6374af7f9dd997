//! Signed-token issuance and validation.
//!
//! Tokens are HS256 JWTs in two classes: short-lived `access` and long-lived
//! `refresh`. They are stateless — nothing is persisted, and validity is
//! determined entirely by the signature and the `exp` claim at validation
//! time.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::auth::AuthError;

/// Signing secrets shorter than this are refused at startup.
pub const MIN_SECRET_BYTES: usize = 32;

/// Token class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Access => write!(f, "access"),
            Self::Refresh => write!(f, "refresh"),
        }
    }
}

/// Claims embedded in every Atlas token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject — user ID.
    pub sub: String,
    /// User email.
    pub email: String,
    /// Token class (`access` or `refresh`).
    pub token_type: TokenKind,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Not valid before (unix seconds).
    pub nbf: i64,
    /// Expiry (unix seconds).
    pub exp: i64,
}

/// Issue a signed token for `user_id`, expiring `ttl` after `now`.
///
/// Tokens issued at distinct instants differ bit-for-bit even for identical
/// subjects, because `iat` moves.
pub fn issue_token(
    user_id: &str,
    email: &str,
    kind: TokenKind,
    ttl: Duration,
    secret: &[u8],
    now: DateTime<Utc>,
) -> Result<String, AuthError> {
    if user_id.is_empty() {
        return Err(AuthError::InvalidInput("user ID cannot be empty".into()));
    }
    if email.is_empty() {
        return Err(AuthError::InvalidInput("email cannot be empty".into()));
    }
    if secret.is_empty() {
        return Err(AuthError::InvalidInput("secret cannot be empty".into()));
    }
    if ttl <= Duration::zero() {
        return Err(AuthError::InvalidInput("token TTL must be positive".into()));
    }

    let claims = TokenClaims {
        sub: user_id.to_string(),
        email: email.to_string(),
        token_type: kind,
        iat: now.timestamp(),
        nbf: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret))
        .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))
}

/// Validate a token and return its claims.
///
/// The signature is checked before any claim is trusted. Expiry is compared
/// against the caller-supplied `now`, so the clock stays injectable.
pub fn validate_token(
    token: &str,
    secret: &[u8],
    now: DateTime<Utc>,
) -> Result<TokenClaims, AuthError> {
    if token.is_empty() || secret.is_empty() {
        return Err(AuthError::TokenInvalid);
    }

    // Expiry is enforced below against the injected clock, not the
    // library's view of the system time.
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;

    let data = decode::<TokenClaims>(token, &DecodingKey::from_secret(secret), &validation)
        .map_err(|_| AuthError::TokenInvalid)?;

    if now.timestamp() >= data.claims.exp {
        return Err(AuthError::TokenExpired);
    }

    Ok(data.claims)
}
