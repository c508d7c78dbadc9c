use chrono::{Duration, Utc};

use crate::config::TokenConfig;
use crate::events::{dispatch, AuthEvent};
use crate::jwt::{EmailActionIssuer, TokenKind};
use crate::mail::Mailer;
use crate::repository::AccountRepository;
use crate::AuthError;

#[derive(Debug, Clone)]
pub struct SendVerificationConfig {
    /// Default: 7 days
    pub verify_email_expiry: Duration,
}

impl Default for SendVerificationConfig {
    fn default() -> Self {
        Self {
            verify_email_expiry: Duration::days(7),
        }
    }
}

impl SendVerificationConfig {
    pub fn from_token_config(tokens: &TokenConfig) -> Self {
        Self {
            verify_email_expiry: tokens.verify_email_expiry,
        }
    }
}

/// Mails a `verify_email` token to the account's address.
pub struct SendVerificationAction<A, J, M> {
    accounts: A,
    issuer: EmailActionIssuer<J>,
    mailer: M,
    config: SendVerificationConfig,
}

impl<A: AccountRepository, J, M: Mailer> SendVerificationAction<A, J, M> {
    pub fn new(accounts: A, issuer: EmailActionIssuer<J>, mailer: M) -> Self {
        Self::with_config(accounts, issuer, mailer, SendVerificationConfig::default())
    }

    pub fn with_config(
        accounts: A,
        issuer: EmailActionIssuer<J>,
        mailer: M,
        config: SendVerificationConfig,
    ) -> Self {
        Self {
            accounts,
            issuer,
            mailer,
            config,
        }
    }

    /// # Returns
    ///
    /// - `Ok(())` - message handed to the mailer
    /// - `Err(AuthError::NotFound)` - no such account
    /// - `Err(AuthError::EmailAlreadyVerified)` - nothing to verify
    /// - `Err(AuthError::EmailDelivery(_))` - the mailer failed
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "send_verification", skip_all, err)
    )]
    pub async fn execute(&self, account_id: i64) -> Result<(), AuthError> {
        let account = self
            .accounts
            .find_account(account_id)
            .await
            .map_err(AuthError::sanitize)?
            .ok_or(AuthError::NotFound)?;

        if account.is_email_verified() {
            return Err(AuthError::EmailAlreadyVerified);
        }

        let token = self.issuer.issue(
            account.id,
            TokenKind::VerifyEmail,
            self.config.verify_email_expiry,
        )?;

        self.mailer
            .send(&account.email, &token, TokenKind::VerifyEmail)
            .await?;

        dispatch(AuthEvent::EmailVerificationSent {
            account_id: account.id,
            at: Utc::now(),
        })
        .await;

        log::info!(
            target: crate::LOG_TARGET,
            "msg=\"verification email sent\", account_id={}",
            account.id
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::test_support::issuer;
    use crate::repository::Account;
    use crate::{MockAccountRepository, MockMailer};

    fn accounts() -> MockAccountRepository {
        let accounts = MockAccountRepository::new();
        accounts.insert(Account::mock(42, "alice", "unused").unverified());
        accounts
    }

    #[tokio::test]
    async fn test_sends_verify_email_token() {
        let mailer = MockMailer::new();
        let action = SendVerificationAction::new(accounts(), issuer(), mailer.clone());

        action.execute(42).await.unwrap();

        let sent = mailer.last().unwrap();
        assert_eq!(sent.to, "alice@example.com");
        assert_eq!(sent.kind, TokenKind::VerifyEmail);
        assert!(!sent.token.is_empty());
    }

    #[tokio::test]
    async fn test_already_verified() {
        let accounts = MockAccountRepository::new();
        accounts.insert(Account::mock(42, "alice", "unused"));
        let mailer = MockMailer::new();
        let action = SendVerificationAction::new(accounts, issuer(), mailer.clone());

        assert_eq!(
            action.execute(42).await.unwrap_err(),
            AuthError::EmailAlreadyVerified
        );
        assert_eq!(mailer.count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_account() {
        let action = SendVerificationAction::new(accounts(), issuer(), MockMailer::new());
        assert_eq!(action.execute(7).await.unwrap_err(), AuthError::NotFound);
    }

    #[tokio::test]
    async fn test_delivery_failure_surfaces() {
        let action = SendVerificationAction::new(accounts(), issuer(), MockMailer::failing());
        assert!(matches!(
            action.execute(42).await,
            Err(AuthError::EmailDelivery(_))
        ));
    }
}
