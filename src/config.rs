//! Configuration for the token core.
//!
//! # Example
//!
//! ```rust
//! use tessera::config::{AuthConfig, TokenConfig};
//! use tessera::JwtConfig;
//! use chrono::Duration;
//!
//! let jwt = JwtConfig::new("a-signing-secret-of-at-least-32-bytes").unwrap();
//!
//! // defaults
//! let config = AuthConfig::new(jwt.clone());
//!
//! // or customize
//! let config = AuthConfig {
//!     tokens: TokenConfig {
//!         access_token_expiry: Duration::minutes(5),
//!         ..Default::default()
//!     },
//!     ..AuthConfig::new(jwt)
//! };
//! ```
//!
//! Hosts that configure through the environment can use
//! [`AuthConfig::from_env`], which reads `TESSERA__*` variables:
//!
//! | Variable | Default |
//! |----------|---------|
//! | `TESSERA__SECRET_KEY` | required, 32+ bytes |
//! | `TESSERA__ALGORITHM` | `HS256` |
//! | `TESSERA__ISSUER`, `TESSERA__AUDIENCE` | unset |
//! | `TESSERA__ACCESS_TOKEN_EXPIRE_MINUTES` | 15 |
//! | `TESSERA__REFRESH_TOKEN_EXPIRE_DAYS` | 7 |
//! | `TESSERA__VERIFY_EMAIL_EXPIRE_HOURS` | 168 |
//! | `TESSERA__RESET_PASSWORD_EXPIRE_MINUTES` | 60 |
//! | `TESSERA__REQUIRE_VERIFIED_EMAIL` | `true` |
//! | `TESSERA__PASSWORD_MIN_LENGTH` | 8 |

use chrono::{Duration, Utc};
use config::{Config, Environment};
use serde::Deserialize;

use crate::jwt::JwtConfig;
use crate::validators::PasswordPolicy;
use crate::AuthError;

/// Everything the actions need, built once at startup.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt: JwtConfig,
    pub tokens: TokenConfig,
    pub password: PasswordPolicy,
    /// Refuse logins until the account's email is verified. Default: true
    pub require_verified_email: bool,
}

impl AuthConfig {
    pub fn new(jwt: JwtConfig) -> Self {
        Self {
            jwt,
            tokens: TokenConfig::default(),
            password: PasswordPolicy::default(),
            require_verified_email: true,
        }
    }

    /// Long-lived tokens and no email verification requirement.
    pub fn development(jwt: JwtConfig) -> Self {
        Self {
            jwt,
            tokens: TokenConfig::development(),
            password: PasswordPolicy::default(),
            require_verified_email: false,
        }
    }

    /// Short-lived tokens and the strict password policy.
    pub fn strict(jwt: JwtConfig) -> Self {
        Self {
            jwt,
            tokens: TokenConfig::strict(),
            password: PasswordPolicy::strict(),
            require_verified_email: true,
        }
    }

    /// Loads `TESSERA__*` environment variables.
    ///
    /// # Errors
    ///
    /// `ConfigurationError` when the secret is missing or too short, the
    /// algorithm is not HS256/384/512, or a lifetime is not positive.
    pub fn from_env() -> Result<Self, AuthError> {
        let settings = Config::builder()
            .add_source(
                Environment::with_prefix("TESSERA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AuthError::ConfigurationError(e.to_string()))?;

        Self::from_settings(settings)
    }

    /// Builds the configuration from an already assembled [`Config`], for
    /// hosts that layer files or overrides of their own.
    pub fn from_settings(settings: Config) -> Result<Self, AuthError> {
        let raw: RawSettings = settings
            .try_deserialize()
            .map_err(|e| AuthError::ConfigurationError(e.to_string()))?;

        let mut jwt = JwtConfig::new(raw.secret_key)?.with_algorithm_name(&raw.algorithm)?;
        if let Some(issuer) = raw.issuer {
            jwt = jwt.with_issuer(issuer);
        }
        if let Some(audience) = raw.audience {
            jwt = jwt.with_audience(audience);
        }

        let defaults = TokenConfig::default();
        let tokens = TokenConfig {
            access_token_expiry: lifetime(
                "access_token_expire_minutes",
                raw.access_token_expire_minutes,
                Duration::try_minutes,
            )?
            .unwrap_or(defaults.access_token_expiry),
            refresh_token_expiry: lifetime(
                "refresh_token_expire_days",
                raw.refresh_token_expire_days,
                Duration::try_days,
            )?
            .unwrap_or(defaults.refresh_token_expiry),
            verify_email_expiry: lifetime(
                "verify_email_expire_hours",
                raw.verify_email_expire_hours,
                Duration::try_hours,
            )?
            .unwrap_or(defaults.verify_email_expiry),
            reset_password_expiry: lifetime(
                "reset_password_expire_minutes",
                raw.reset_password_expire_minutes,
                Duration::try_minutes,
            )?
            .unwrap_or(defaults.reset_password_expiry),
        };

        let mut password = PasswordPolicy::default();
        if let Some(min_length) = raw.password_min_length {
            password.min_length = min_length;
        }

        let config = Self {
            jwt,
            tokens,
            password,
            require_verified_email: raw.require_verified_email.unwrap_or(true),
        };

        log::debug!(
            target: crate::LOG_TARGET,
            "msg=\"configuration loaded\", algorithm=\"{:?}\", access_ttl_secs={}, refresh_ttl_secs={}",
            config.jwt.algorithm(),
            config.tokens.access_token_expiry.num_seconds(),
            config.tokens.refresh_token_expiry.num_seconds()
        );

        Ok(config)
    }
}

/// Token lifetimes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenConfig {
    /// Default: 15 minutes
    pub access_token_expiry: Duration,

    /// Default: 7 days
    pub refresh_token_expiry: Duration,

    /// Default: 7 days
    pub verify_email_expiry: Duration,

    /// Default: 1 hour
    pub reset_password_expiry: Duration,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            access_token_expiry: Duration::minutes(15),
            refresh_token_expiry: Duration::days(7),
            verify_email_expiry: Duration::days(7),
            reset_password_expiry: Duration::hours(1),
        }
    }
}

impl TokenConfig {
    pub fn development() -> Self {
        Self {
            access_token_expiry: Duration::hours(24),
            refresh_token_expiry: Duration::days(30),
            verify_email_expiry: Duration::days(7),
            reset_password_expiry: Duration::hours(2),
        }
    }

    pub fn strict() -> Self {
        Self {
            access_token_expiry: Duration::minutes(5),
            refresh_token_expiry: Duration::days(1),
            verify_email_expiry: Duration::hours(12),
            reset_password_expiry: Duration::minutes(30),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawSettings {
    secret_key: String,
    #[serde(default = "default_algorithm")]
    algorithm: String,
    issuer: Option<String>,
    audience: Option<String>,
    access_token_expire_minutes: Option<i64>,
    refresh_token_expire_days: Option<i64>,
    verify_email_expire_hours: Option<i64>,
    reset_password_expire_minutes: Option<i64>,
    require_verified_email: Option<bool>,
    password_min_length: Option<usize>,
}

fn default_algorithm() -> String {
    "HS256".to_owned()
}

/// Converts a configured count into a lifetime that is positive and can be
/// added to the current time.
fn lifetime(
    key: &str,
    value: Option<i64>,
    unit: fn(i64) -> Option<Duration>,
) -> Result<Option<Duration>, AuthError> {
    let Some(value) = value else {
        return Ok(None);
    };

    if value <= 0 {
        return Err(AuthError::ConfigurationError(format!(
            "{key} must be positive"
        )));
    }

    unit(value)
        .filter(|d| Utc::now().checked_add_signed(*d).is_some())
        .map(Some)
        .ok_or_else(|| AuthError::ConfigurationError(format!("{key} out of range")))
}
