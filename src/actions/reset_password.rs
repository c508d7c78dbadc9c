use chrono::Utc;

use crate::crypto::{Argon2Hasher, PasswordHasher};
use crate::events::{dispatch, AuthEvent};
use crate::jwt::{EmailActionIssuer, TokenKind};
use crate::repository::{AccountRepository, JtiRegistry, RefreshTokenRepository};
use crate::validators::PasswordPolicy;
use crate::AuthError;

/// Sets a new password from a `reset_password` token and ends every
/// session of the account.
pub struct ResetPasswordAction<A, R, J, H = Argon2Hasher> {
    accounts: A,
    refresh_tokens: R,
    issuer: EmailActionIssuer<J>,
    hasher: H,
    policy: PasswordPolicy,
}

impl<A, R, J> ResetPasswordAction<A, R, J>
where
    A: AccountRepository,
    R: RefreshTokenRepository,
    J: JtiRegistry,
{
    pub fn new(accounts: A, refresh_tokens: R, issuer: EmailActionIssuer<J>) -> Self {
        Self::with_policy(accounts, refresh_tokens, issuer, PasswordPolicy::default())
    }

    pub fn with_policy(
        accounts: A,
        refresh_tokens: R,
        issuer: EmailActionIssuer<J>,
        policy: PasswordPolicy,
    ) -> Self {
        Self {
            accounts,
            refresh_tokens,
            issuer,
            hasher: Argon2Hasher::default(),
            policy,
        }
    }
}

impl<A, R, J, H> ResetPasswordAction<A, R, J, H>
where
    A: AccountRepository,
    R: RefreshTokenRepository,
    J: JtiRegistry,
    H: PasswordHasher,
{
    #[must_use]
    pub fn with_hasher<H2: PasswordHasher>(self, hasher: H2) -> ResetPasswordAction<A, R, J, H2> {
        ResetPasswordAction {
            accounts: self.accounts,
            refresh_tokens: self.refresh_tokens,
            issuer: self.issuer,
            hasher,
            policy: self.policy,
        }
    }

    /// The password is checked against the policy before the token is
    /// consumed, so a rejected password leaves the link usable.
    ///
    /// # Returns
    ///
    /// - `Ok(account_id)` - password replaced, all refresh tokens revoked
    /// - `Err(AuthError::Validation(_))` - password breaks the policy
    /// - `Err(AuthError::AlreadyUsed)` - token consumed before
    /// - `Err(AuthError::WrongKind)` - not a `reset_password` token
    /// - `Err(AuthError::Unauthorized)` - the account no longer exists
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "reset_password", skip_all, err)
    )]
    pub async fn execute(&self, token: &str, new_password: &str) -> Result<i64, AuthError> {
        self.policy.validate(new_password)?;

        let account_id = self
            .issuer
            .consume(token, TokenKind::ResetPassword)
            .await
            .map_err(AuthError::sanitize)?;

        if self
            .accounts
            .find_account(account_id)
            .await
            .map_err(AuthError::sanitize)?
            .is_none()
        {
            return Err(AuthError::Unauthorized);
        }

        let hashed = self.hasher.hash(new_password)?;
        self.accounts
            .set_password(account_id, &hashed)
            .await
            .map_err(AuthError::sanitize)?;

        let revoked = self
            .refresh_tokens
            .revoke_all_for_account(account_id)
            .await
            .map_err(AuthError::sanitize)?;

        dispatch(AuthEvent::PasswordResetCompleted {
            account_id,
            at: Utc::now(),
        })
        .await;
        dispatch(AuthEvent::AllTokensRevoked {
            account_id,
            count: revoked,
            at: Utc::now(),
        })
        .await;

        log::info!(
            target: crate::LOG_TARGET,
            "msg=\"password reset\", account_id={account_id}, sessions_revoked={revoked}"
        );

        Ok(account_id)
    }
}
