use chrono::{Duration, Utc};

use crate::config::TokenConfig;
use crate::events::{dispatch, AuthEvent};
use crate::jwt::{EmailActionIssuer, TokenKind};
use crate::mail::Mailer;
use crate::repository::AccountRepository;
use crate::AuthError;

#[derive(Debug, Clone)]
pub struct ForgotPasswordConfig {
    /// Default: 1 hour
    pub reset_password_expiry: Duration,
}

impl Default for ForgotPasswordConfig {
    fn default() -> Self {
        Self {
            reset_password_expiry: Duration::hours(1),
        }
    }
}

impl ForgotPasswordConfig {
    pub fn from_token_config(tokens: &TokenConfig) -> Self {
        Self {
            reset_password_expiry: tokens.reset_password_expiry,
        }
    }
}

/// Mails a `reset_password` token.
///
/// Unknown and inactive addresses succeed silently so callers cannot probe
/// which emails have accounts.
pub struct ForgotPasswordAction<A, J, M> {
    accounts: A,
    issuer: EmailActionIssuer<J>,
    mailer: M,
    config: ForgotPasswordConfig,
}

impl<A: AccountRepository, J, M: Mailer> ForgotPasswordAction<A, J, M> {
    pub fn new(accounts: A, issuer: EmailActionIssuer<J>, mailer: M) -> Self {
        Self::with_config(accounts, issuer, mailer, ForgotPasswordConfig::default())
    }

    pub fn with_config(
        accounts: A,
        issuer: EmailActionIssuer<J>,
        mailer: M,
        config: ForgotPasswordConfig,
    ) -> Self {
        Self {
            accounts,
            issuer,
            mailer,
            config,
        }
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "forgot_password", skip_all, err)
    )]
    pub async fn execute(&self, email: &str) -> Result<(), AuthError> {
        let account = self
            .accounts
            .find_account_by_login(email)
            .await
            .map_err(AuthError::sanitize)?;

        let Some(account) = account.filter(|a| a.is_active) else {
            log::info!(
                target: crate::LOG_TARGET,
                "msg=\"password reset requested for unknown account\""
            );
            return Ok(());
        };

        let token = self.issuer.issue(
            account.id,
            TokenKind::ResetPassword,
            self.config.reset_password_expiry,
        )?;

        self.mailer
            .send(&account.email, &token, TokenKind::ResetPassword)
            .await?;

        dispatch(AuthEvent::PasswordResetRequested {
            account_id: account.id,
            at: Utc::now(),
        })
        .await;

        log::info!(
            target: crate::LOG_TARGET,
            "msg=\"password reset requested\", account_id={}",
            account.id
        );

        Ok(())
    }
}
