use chrono::Duration;

use super::{JwtCodec, TokenKind};
use crate::repository::JtiRegistry;
use crate::{AuthError, SecretString};

/// Mints and consumes single-use `verify_email` / `reset_password` tokens.
///
/// Tokens are ordinary signed tokens; single use is enforced by recording
/// each consumed jti in a [`JtiRegistry`] until the token would have expired.
#[derive(Clone)]
pub struct EmailActionIssuer<J> {
    codec: JwtCodec,
    used: J,
}

impl<J> EmailActionIssuer<J> {
    pub fn new(codec: JwtCodec, used: J) -> Self {
        Self { codec, used }
    }

    /// Fails with `WrongKind` for anything other than an email action kind.
    pub fn issue(
        &self,
        account_id: i64,
        kind: TokenKind,
        ttl: Duration,
    ) -> Result<SecretString, AuthError> {
        if !kind.is_email_action() {
            return Err(AuthError::WrongKind);
        }

        let (token, _) = self.codec.mint(account_id, kind, ttl)?;
        Ok(SecretString::new(token))
    }
}

impl<J: JtiRegistry> EmailActionIssuer<J> {
    /// Verifies `token` as a `kind` token and burns it.
    ///
    /// Returns the account id the side effect should be applied to.
    pub async fn consume(&self, token: &str, kind: TokenKind) -> Result<i64, AuthError> {
        if !kind.is_email_action() {
            return Err(AuthError::WrongKind);
        }

        let claims = self.codec.decode(token)?;
        if claims.kind != kind {
            return Err(AuthError::WrongKind);
        }

        let account_id = claims.account_id()?;
        let expires_at = claims.expires_at()?;

        if !self.used.insert(&claims.jti, expires_at).await? {
            log::warn!(
                target: crate::LOG_TARGET,
                "msg=\"email action token replayed\", kind=\"{}\", account_id={account_id}",
                kind.as_str()
            );
            return Err(AuthError::AlreadyUsed);
        }

        Ok(account_id)
    }
}
