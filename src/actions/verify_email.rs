use chrono::Utc;

use crate::events::{dispatch, AuthEvent};
use crate::jwt::{EmailActionIssuer, TokenKind};
use crate::repository::{AccountRepository, JtiRegistry};
use crate::AuthError;

pub struct VerifyEmailAction<A, J> {
    accounts: A,
    issuer: EmailActionIssuer<J>,
}

impl<A: AccountRepository, J: JtiRegistry> VerifyEmailAction<A, J> {
    pub fn new(accounts: A, issuer: EmailActionIssuer<J>) -> Self {
        Self { accounts, issuer }
    }

    /// Burns a `verify_email` token and marks its account verified.
    ///
    /// # Returns
    ///
    /// - `Ok(account_id)` - the account is now verified
    /// - `Err(AuthError::AlreadyUsed)` - token consumed before
    /// - `Err(AuthError::WrongKind)` - not a `verify_email` token
    /// - `Err(AuthError::EmailAlreadyVerified)` - verified through another link
    /// - `Err(AuthError::Unauthorized)` - the account no longer exists
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "verify_email", skip_all, err)
    )]
    pub async fn execute(&self, token: &str) -> Result<i64, AuthError> {
        let account_id = self
            .issuer
            .consume(token, TokenKind::VerifyEmail)
            .await
            .map_err(AuthError::sanitize)?;

        let account = self
            .accounts
            .find_account(account_id)
            .await
            .map_err(AuthError::sanitize)?
            .ok_or(AuthError::Unauthorized)?;

        if account.is_email_verified() {
            return Err(AuthError::EmailAlreadyVerified);
        }

        self.accounts
            .mark_email_verified(account_id)
            .await
            .map_err(AuthError::sanitize)?;

        dispatch(AuthEvent::EmailVerified {
            account_id,
            at: Utc::now(),
        })
        .await;

        log::info!(
            target: crate::LOG_TARGET,
            "msg=\"email verified\", account_id={account_id}"
        );

        Ok(account_id)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::actions::test_support::issuer;
    use crate::repository::Account;
    use crate::MockAccountRepository;

    fn accounts() -> MockAccountRepository {
        let accounts = MockAccountRepository::new();
        accounts.insert(Account::mock(42, "alice", "unused").unverified());
        accounts
    }

    #[tokio::test]
    async fn test_verify_email_once() {
        let accounts = accounts();
        let issuer = issuer();
        let token = issuer
            .issue(42, TokenKind::VerifyEmail, Duration::days(7))
            .unwrap();
        let action = VerifyEmailAction::new(accounts.clone(), issuer);

        assert_eq!(action.execute(token.expose_secret()).await.unwrap(), 42);
        assert!(accounts.get(42).unwrap().is_email_verified());

        assert_eq!(
            action.execute(token.expose_secret()).await.unwrap_err(),
            AuthError::AlreadyUsed
        );
    }

    #[tokio::test]
    async fn test_reset_token_rejected() {
        let issuer = issuer();
        let token = issuer
            .issue(42, TokenKind::ResetPassword, Duration::hours(1))
            .unwrap();
        let action = VerifyEmailAction::new(accounts(), issuer);

        assert_eq!(
            action.execute(token.expose_secret()).await.unwrap_err(),
            AuthError::WrongKind
        );
    }

    #[tokio::test]
    async fn test_second_link_after_verification() {
        let issuer = issuer();
        let first = issuer
            .issue(42, TokenKind::VerifyEmail, Duration::days(7))
            .unwrap();
        let second = issuer
            .issue(42, TokenKind::VerifyEmail, Duration::days(7))
            .unwrap();
        let action = VerifyEmailAction::new(accounts(), issuer);

        action.execute(first.expose_secret()).await.unwrap();
        assert_eq!(
            action.execute(second.expose_secret()).await.unwrap_err(),
            AuthError::EmailAlreadyVerified
        );
    }

    #[tokio::test]
    async fn test_deleted_account() {
        let issuer = issuer();
        let token = issuer
            .issue(7, TokenKind::VerifyEmail, Duration::days(7))
            .unwrap();
        let action = VerifyEmailAction::new(accounts(), issuer);

        assert_eq!(
            action.execute(token.expose_secret()).await.unwrap_err(),
            AuthError::Unauthorized
        );
    }
}
