use chrono::{Duration, Utc};

use crate::config::AuthConfig;
use crate::events::{dispatch, AuthEvent};
use crate::jwt::{JwtCodec, TokenKind, TokenPair};
use crate::repository::{AccountRepository, RefreshTokenRepository, SessionMetadata};
use crate::AuthError;

#[derive(Debug, Clone)]
pub struct LoginConfig {
    /// Default: 15 minutes
    pub access_token_expiry: Duration,

    /// Default: 7 days
    pub refresh_token_expiry: Duration,

    /// Default: true
    pub require_verified_email: bool,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            access_token_expiry: Duration::minutes(15),
            refresh_token_expiry: Duration::days(7),
            require_verified_email: true,
        }
    }
}

impl LoginConfig {
    pub fn from_auth_config(config: &AuthConfig) -> Self {
        Self {
            access_token_expiry: config.tokens.access_token_expiry,
            refresh_token_expiry: config.tokens.refresh_token_expiry,
            require_verified_email: config.require_verified_email,
        }
    }
}

pub struct LoginAction<A, R> {
    accounts: A,
    refresh_tokens: R,
    codec: JwtCodec,
    config: LoginConfig,
}

impl<A: AccountRepository, R: RefreshTokenRepository> LoginAction<A, R> {
    pub fn new(accounts: A, refresh_tokens: R, codec: JwtCodec) -> Self {
        Self::with_config(accounts, refresh_tokens, codec, LoginConfig::default())
    }

    pub fn with_config(accounts: A, refresh_tokens: R, codec: JwtCodec, config: LoginConfig) -> Self {
        Self {
            accounts,
            refresh_tokens,
            codec,
            config,
        }
    }

    /// Exchanges a username or email plus password for a token pair.
    ///
    /// # Returns
    ///
    /// - `Ok(pair)` - access token and a freshly issued refresh token
    /// - `Err(AuthError::InvalidCredentials)` - unknown login, wrong password or inactive account
    /// - `Err(AuthError::EmailNotVerified)` - correct password, email not verified yet
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "login", skip_all, err)
    )]
    pub async fn execute(
        &self,
        login: &str,
        password: &str,
        metadata: &SessionMetadata,
    ) -> Result<TokenPair, AuthError> {
        let Some(account) = self
            .accounts
            .find_account_by_login(login)
            .await
            .map_err(AuthError::sanitize)?
        else {
            return Err(self.failed(login, "unknown account").await);
        };

        let verified = match self.accounts.verify_password(&account, password).await {
            Ok(verified) => verified,
            Err(AuthError::PasswordHashError) => false,
            Err(e) => return Err(e.sanitize()),
        };
        if !verified {
            return Err(self.failed(login, "invalid password").await);
        }

        if !account.is_active {
            return Err(self.failed(login, "inactive account").await);
        }

        if self.config.require_verified_email && !account.is_email_verified() {
            log::info!(
                target: crate::LOG_TARGET,
                "msg=\"login refused\", reason=\"email not verified\", account_id={}",
                account.id
            );
            return Err(AuthError::EmailNotVerified);
        }

        let (access_token, _) =
            self.codec
                .mint(account.id, TokenKind::Access, self.config.access_token_expiry)?;

        let issued = self
            .refresh_tokens
            .issue(account.id, self.config.refresh_token_expiry, metadata)
            .await
            .map_err(AuthError::sanitize)?;

        dispatch(AuthEvent::LoginSucceeded {
            account_id: account.id,
            at: Utc::now(),
        })
        .await;

        log::info!(
            target: crate::LOG_TARGET,
            "msg=\"login success\", account_id={}, jti=\"{}\"",
            account.id,
            issued.record.jti
        );

        Ok(TokenPair::bearer(
            access_token,
            issued.raw,
            self.config.access_token_expiry,
        ))
    }

    async fn failed(&self, login: &str, reason: &'static str) -> AuthError {
        log::info!(
            target: crate::LOG_TARGET,
            "msg=\"login failed\", reason=\"{reason}\""
        );

        dispatch(AuthEvent::LoginFailed {
            login: login.to_owned(),
            reason,
            at: Utc::now(),
        })
        .await;

        AuthError::InvalidCredentials
    }
}
