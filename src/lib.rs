//! Token lifecycle core for the contacts backend.
//!
//! `tessera` issues, verifies, rotates and revokes three families of tokens:
//!
//! - short-lived signed access tokens,
//! - refresh tokens persisted server-side and rotated on every use,
//! - single-use email action tokens (email verification, password reset).
//!
//! Transport, account storage and email delivery are collaborators supplied
//! by the host application through the traits in [`repository`] and [`mail`].
//!
//! # Example
//!
//! ```rust,ignore
//! use tessera::actions::{LoginAction, LoginConfig, RefreshTokenAction};
//! use tessera::{AuthConfig, JwtCodec, SessionMetadata};
//!
//! let config = AuthConfig::from_env()?;
//! let codec = JwtCodec::new(config.jwt.clone());
//!
//! let login = LoginAction::with_config(
//!     accounts.clone(),
//!     refresh_tokens.clone(),
//!     codec.clone(),
//!     LoginConfig::from_auth_config(&config),
//! );
//! let pair = login.execute("alice", "password", &SessionMetadata::default()).await?;
//!
//! let refresh = RefreshTokenAction::new(accounts, refresh_tokens, codec);
//! let rotated = refresh
//!     .execute(pair.refresh_token.expose_secret(), &SessionMetadata::default())
//!     .await?;
//! ```

pub mod actions;
pub mod config;
pub mod crypto;
pub mod events;
pub mod jwt;
pub mod mail;
pub mod repository;
mod secret;
pub mod validators;

#[cfg(feature = "sqlx_postgres")]
pub mod postgres;
#[cfg(feature = "sqlx_sqlite")]
pub mod sqlite;

use std::fmt;

pub use config::{AuthConfig, TokenConfig};
pub use events::register_event_listeners;
pub use jwt::{Claims, EmailActionIssuer, JwtCodec, JwtConfig, TokenKind, TokenPair};
pub use mail::Mailer;
pub use repository::{
    Account, AccountRepository, InMemoryJtiRegistry, IssuedRefreshToken, JtiRegistry,
    RefreshTokenRecord, RefreshTokenRepository, SessionMetadata, TokenState,
};
pub use secret::SecretString;
pub use validators::ValidationError;

#[cfg(any(test, feature = "mocks"))]
pub use mail::MockMailer;
#[cfg(any(test, feature = "mocks"))]
pub use repository::{MockAccountRepository, MockRefreshTokenRepository};

/// Log target shared by every module of the crate.
pub(crate) const LOG_TARGET: &str = "tessera_auth";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The token could not be parsed.
    Malformed,
    /// The integrity tag does not match the payload.
    InvalidSignature,
    /// The token is past its expiry.
    Expired,
    /// No matching, non-expired record exists.
    NotFound,
    /// The record has been revoked.
    Revoked,
    /// A rotated or revoked refresh token was presented again.
    TokenReuseDetected,
    /// The token kind does not match the requested operation.
    WrongKind,
    /// The single-use token has already been consumed.
    AlreadyUsed,
    InvalidCredentials,
    Unauthorized,
    EmailNotVerified,
    EmailAlreadyVerified,
    Validation(ValidationError),
    PasswordHashError,
    EmailDelivery(String),
    ConfigurationError(String),
    /// Raw storage failure. Actions convert this into [`AuthError::Internal`].
    DatabaseError(String),
    Internal,
}

impl AuthError {
    /// Returns true for failures a transport should report as "invalid session".
    pub fn is_session_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound | Self::Revoked | Self::Expired | Self::TokenReuseDetected
        )
    }

    /// Collapses storage failures into [`AuthError::Internal`] at the action boundary.
    pub(crate) fn sanitize(self) -> Self {
        match self {
            Self::DatabaseError(e) => {
                log::error!(target: LOG_TARGET, "msg=\"storage failure\", error=\"{e}\"");
                Self::Internal
            }
            other => other,
        }
    }
}

impl std::error::Error for AuthError {}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "Malformed token"),
            Self::InvalidSignature => write!(f, "Invalid token signature"),
            Self::Expired => write!(f, "Token has expired"),
            Self::NotFound => write!(f, "Token not found"),
            Self::Revoked => write!(f, "Token has been revoked"),
            Self::TokenReuseDetected => write!(f, "Refresh token reuse detected"),
            Self::WrongKind => write!(f, "Token kind does not match"),
            Self::AlreadyUsed => write!(f, "Token has already been used"),
            Self::InvalidCredentials => write!(f, "Invalid username or password"),
            Self::Unauthorized => write!(f, "Unauthorized"),
            Self::EmailNotVerified => write!(f, "Email address is not verified"),
            Self::EmailAlreadyVerified => write!(f, "Email address is already verified"),
            Self::Validation(e) => write!(f, "{e}"),
            Self::PasswordHashError => write!(f, "Failed to hash password"),
            Self::EmailDelivery(msg) => write!(f, "Email delivery failed: {msg}"),
            Self::ConfigurationError(msg) => write!(f, "Configuration error: {msg}"),
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::Internal => write!(f, "Internal error"),
        }
    }
}

impl From<ValidationError> for AuthError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_errors_grouped() {
        assert!(AuthError::NotFound.is_session_error());
        assert!(AuthError::Revoked.is_session_error());
        assert!(AuthError::Expired.is_session_error());
        assert!(AuthError::TokenReuseDetected.is_session_error());
        assert!(!AuthError::InvalidCredentials.is_session_error());
        assert!(!AuthError::AlreadyUsed.is_session_error());
    }

    #[test]
    fn test_sanitize_hides_database_detail() {
        let err = AuthError::DatabaseError("connection refused".to_owned()).sanitize();
        assert_eq!(err, AuthError::Internal);
        assert_eq!(AuthError::Revoked.sanitize(), AuthError::Revoked);
    }

    #[test]
    fn test_display() {
        assert_eq!(AuthError::AlreadyUsed.to_string(), "Token has already been used");
        assert_eq!(
            AuthError::EmailDelivery("smtp down".to_owned()).to_string(),
            "Email delivery failed: smtp down"
        );
    }
}
