use chrono::Utc;

use crate::events::{dispatch, AuthEvent};
use crate::jwt::{JwtCodec, TokenKind};
use crate::repository::{JtiRegistry, RefreshTokenRepository};
use crate::AuthError;

/// Ends a session.
///
/// The refresh token is revoked. When the caller also hands over its access
/// token, that token's jti is denied until it expires so it stops working
/// before its natural end.
pub struct LogoutAction<R, J> {
    refresh_tokens: R,
    access_denylist: J,
    codec: JwtCodec,
}

impl<R: RefreshTokenRepository, J: JtiRegistry> LogoutAction<R, J> {
    pub fn new(refresh_tokens: R, access_denylist: J, codec: JwtCodec) -> Self {
        Self {
            refresh_tokens,
            access_denylist,
            codec,
        }
    }

    /// Unknown or already revoked refresh tokens are a successful no-op.
    /// An access token that no longer decodes is ignored.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "logout", skip_all, err)
    )]
    pub async fn execute(
        &self,
        raw_refresh_token: &str,
        access_token: Option<&str>,
    ) -> Result<(), AuthError> {
        let record = self
            .refresh_tokens
            .find_by_token(raw_refresh_token)
            .await
            .map_err(AuthError::sanitize)?;

        if let Some(ref record) = record {
            if !record.revoked {
                self.refresh_tokens
                    .revoke(&record.jti)
                    .await
                    .map_err(AuthError::sanitize)?;
            }
        }

        if let Some(token) = access_token {
            self.deny_access_token(token).await?;
        }

        if let Some(record) = record {
            dispatch(AuthEvent::LoggedOut {
                account_id: record.account_id,
                at: Utc::now(),
            })
            .await;

            log::info!(
                target: crate::LOG_TARGET,
                "msg=\"logout success\", account_id={}, jti=\"{}\"",
                record.account_id,
                record.jti
            );
        }

        Ok(())
    }

    async fn deny_access_token(&self, token: &str) -> Result<(), AuthError> {
        let claims = match self.codec.decode(token) {
            Ok(claims) if claims.kind == TokenKind::Access => claims,
            Ok(_) | Err(_) => {
                log::debug!(
                    target: crate::LOG_TARGET,
                    "msg=\"logout ignored unusable access token\""
                );
                return Ok(());
            }
        };

        let expires_at = claims.expires_at()?;
        self.access_denylist
            .insert(&claims.jti, expires_at)
            .await
            .map_err(AuthError::sanitize)?;

        Ok(())
    }
}
