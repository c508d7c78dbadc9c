use chrono::{Duration, Utc};

use crate::config::TokenConfig;
use crate::events::{dispatch, AuthEvent};
use crate::jwt::{JwtCodec, TokenKind, TokenPair};
use crate::repository::{
    AccountRepository, RefreshTokenRecord, RefreshTokenRepository, SessionMetadata, TokenState,
};
use crate::AuthError;

#[derive(Debug, Clone)]
pub struct RefreshTokenConfig {
    /// Lifetime of the access token minted on refresh. Default: 15 minutes
    pub access_token_expiry: Duration,

    /// Lifetime of the successor refresh token. Default: 7 days
    pub refresh_token_expiry: Duration,
}

impl Default for RefreshTokenConfig {
    fn default() -> Self {
        Self {
            access_token_expiry: Duration::minutes(15),
            refresh_token_expiry: Duration::days(7),
        }
    }
}

impl RefreshTokenConfig {
    pub fn from_token_config(tokens: &TokenConfig) -> Self {
        Self {
            access_token_expiry: tokens.access_token_expiry,
            refresh_token_expiry: tokens.refresh_token_expiry,
        }
    }
}

/// Rotates a refresh token into a new token pair.
///
/// A refresh token can be exchanged once. Presenting a rotated or revoked
/// token again is treated as theft: every session of the account is
/// revoked and the call fails with `TokenReuseDetected`.
pub struct RefreshTokenAction<A, R> {
    accounts: A,
    refresh_tokens: R,
    codec: JwtCodec,
    config: RefreshTokenConfig,
}

impl<A: AccountRepository, R: RefreshTokenRepository> RefreshTokenAction<A, R> {
    pub fn new(accounts: A, refresh_tokens: R, codec: JwtCodec) -> Self {
        Self::with_config(accounts, refresh_tokens, codec, RefreshTokenConfig::default())
    }

    pub fn with_config(
        accounts: A,
        refresh_tokens: R,
        codec: JwtCodec,
        config: RefreshTokenConfig,
    ) -> Self {
        Self {
            accounts,
            refresh_tokens,
            codec,
            config,
        }
    }

    /// # Returns
    ///
    /// - `Ok(pair)` - new access token and the successor refresh token
    /// - `Err(AuthError::NotFound)` - unknown token
    /// - `Err(AuthError::Expired)` - token past its expiry
    /// - `Err(AuthError::TokenReuseDetected)` - token already rotated or revoked
    /// - `Err(AuthError::Unauthorized)` - account gone or deactivated
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "refresh_token", skip_all, err)
    )]
    pub async fn execute(
        &self,
        raw_token: &str,
        metadata: &SessionMetadata,
    ) -> Result<TokenPair, AuthError> {
        let record = self
            .refresh_tokens
            .find_by_token(raw_token)
            .await
            .map_err(AuthError::sanitize)?
            .ok_or(AuthError::NotFound)?;

        match record.state() {
            TokenState::Active => {}
            TokenState::Rotated | TokenState::Revoked => {
                return Err(self.reuse_detected(&record).await);
            }
            TokenState::Expired => return Err(AuthError::Expired),
        }

        let account = self
            .accounts
            .find_account(record.account_id)
            .await
            .map_err(AuthError::sanitize)?;

        if !account.is_some_and(|a| a.is_active) {
            log::warn!(
                target: crate::LOG_TARGET,
                "msg=\"refresh for unavailable account\", account_id={}",
                record.account_id
            );
            self.refresh_tokens
                .revoke(&record.jti)
                .await
                .map_err(AuthError::sanitize)?;
            return Err(AuthError::Unauthorized);
        }

        let (access_token, _) = self.codec.mint(
            record.account_id,
            TokenKind::Access,
            self.config.access_token_expiry,
        )?;

        let issued = match self
            .refresh_tokens
            .rotate(
                &record.jti,
                record.account_id,
                self.config.refresh_token_expiry,
                metadata,
            )
            .await
        {
            Ok(issued) => issued,
            // another request rotated or revoked it between the lookup and here
            Err(AuthError::Revoked) => return Err(self.reuse_detected(&record).await),
            Err(e) => return Err(e.sanitize()),
        };

        dispatch(AuthEvent::TokenRefreshed {
            account_id: record.account_id,
            jti: issued.record.jti.clone(),
            at: Utc::now(),
        })
        .await;

        log::info!(
            target: crate::LOG_TARGET,
            "msg=\"token refreshed\", account_id={}, old_jti=\"{}\", new_jti=\"{}\"",
            record.account_id,
            record.jti,
            issued.record.jti
        );

        Ok(TokenPair::bearer(
            access_token,
            issued.raw,
            self.config.access_token_expiry,
        ))
    }

    async fn reuse_detected(&self, record: &RefreshTokenRecord) -> AuthError {
        log::warn!(
            target: crate::LOG_TARGET,
            "msg=\"refresh token reuse detected\", account_id={}, jti=\"{}\"",
            record.account_id,
            record.jti
        );

        dispatch(AuthEvent::TokenReuseDetected {
            account_id: record.account_id,
            jti: record.jti.clone(),
            at: Utc::now(),
        })
        .await;

        match self
            .refresh_tokens
            .revoke_all_for_account(record.account_id)
            .await
        {
            Ok(count) => {
                dispatch(AuthEvent::AllTokensRevoked {
                    account_id: record.account_id,
                    count,
                    at: Utc::now(),
                })
                .await;
                AuthError::TokenReuseDetected
            }
            Err(e) => e.sanitize(),
        }
    }
}
