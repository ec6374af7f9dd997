//! API server configuration.

use std::time::Duration;

use thiserror::Error;

use atlas_core::auth::password::DEFAULT_BCRYPT_COST;
use atlas_core::auth::token::MIN_SECRET_BYTES;

/// Allowed bcrypt cost range. Below 10 is too cheap to blunt offline
/// attacks; above 14 a burst of logins becomes its own denial of service.
const MIN_BCRYPT_COST: u32 = 10;
const MAX_BCRYPT_COST: u32 = 14;

/// Configuration problems that abort startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JWT_SECRET is required")]
    MissingSecret,

    #[error("JWT_SECRET must be at least 32 bytes")]
    SecretTooShort,

    #[error("BCRYPT_COST must be between 10 and 14, got {0}")]
    BcryptCost(u32),

    #[error("invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

/// Configuration for the auth API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3001").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Token signing secret, minimum 32 bytes.
    pub jwt_secret: String,
    /// bcrypt work factor.
    pub bcrypt_cost: u32,
    /// Access token lifetime.
    pub access_token_ttl: Duration,
    /// Refresh token lifetime.
    pub refresh_token_ttl: Duration,
    /// Admission budget per client per minute.
    pub rate_limit_per_minute: u32,
    /// Bound on any single store call.
    pub store_timeout: Duration,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                 | Default                           |
    /// |--------------------------|-----------------------------------|
    /// | `BIND_ADDR`              | `127.0.0.1:3001`                  |
    /// | `DATABASE_URL`           | `postgres://localhost:5432/atlas` |
    /// | `JWT_SECRET`             | (required)                        |
    /// | `BCRYPT_COST`            | `12`                              |
    /// | `ACCESS_TOKEN_TTL_SECS`  | `900` (15 minutes)                |
    /// | `REFRESH_TOKEN_TTL_SECS` | `604800` (7 days)                 |
    /// | `RATE_LIMIT_PER_MINUTE`  | `10`                              |
    /// | `STORE_TIMEOUT_SECS`     | `5`                               |
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3001".into()),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/atlas".into()),
            jwt_secret: std::env::var("JWT_SECRET").map_err(|_| ConfigError::MissingSecret)?,
            bcrypt_cost: env_u64("BCRYPT_COST", DEFAULT_BCRYPT_COST as u64)? as u32,
            access_token_ttl: Duration::from_secs(env_u64("ACCESS_TOKEN_TTL_SECS", 900)?),
            refresh_token_ttl: Duration::from_secs(env_u64("REFRESH_TOKEN_TTL_SECS", 604_800)?),
            rate_limit_per_minute: env_u64("RATE_LIMIT_PER_MINUTE", 10)? as u32,
            store_timeout: Duration::from_secs(env_u64("STORE_TIMEOUT_SECS", 5)?),
        };
        config.validate()?;
        Ok(config)
    }

    /// Startup-time sanity checks; the server refuses to run on failure.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        if self.jwt_secret.len() < MIN_SECRET_BYTES {
            return Err(ConfigError::SecretTooShort);
        }
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&self.bcrypt_cost) {
            return Err(ConfigError::BcryptCost(self.bcrypt_cost));
        }
        Ok(())
    }
}

fn env_u64(var: &'static str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value: raw }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ApiConfig {
        ApiConfig {
            bind_addr: "127.0.0.1:0".into(),
            database_url: "postgres://localhost:5432/atlas".into(),
            jwt_secret: "config-test-secret-0123456789abcdef".into(),
            bcrypt_cost: 12,
            access_token_ttl: Duration::from_secs(900),
            refresh_token_ttl: Duration::from_secs(604_800),
            rate_limit_per_minute: 10,
            store_timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn short_secret_is_refused() {
        let mut config = config();
        config.jwt_secret = "too-short".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SecretTooShort)
        ));
    }

    #[test]
    fn bcrypt_cost_must_stay_in_range() {
        for cost in [9, 15] {
            let mut config = config();
            config.bcrypt_cost = cost;
            assert!(matches!(
                config.validate(),
                Err(ConfigError::BcryptCost(c)) if c == cost
            ));
        }
    }
}
