use crate::jwt::{JwtCodec, TokenKind};
use crate::repository::{Account, AccountRepository, JtiRegistry};
use crate::AuthError;

/// Resolves a bearer access token to its account.
pub struct AuthenticateAction<A, J> {
    accounts: A,
    access_denylist: J,
    codec: JwtCodec,
}

impl<A: AccountRepository, J: JtiRegistry> AuthenticateAction<A, J> {
    pub fn new(accounts: A, access_denylist: J, codec: JwtCodec) -> Self {
        Self {
            accounts,
            access_denylist,
            codec,
        }
    }

    /// Every rejection is `Unauthorized`; the cause is only logged.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "authenticate", skip_all, err)
    )]
    pub async fn execute(&self, access_token: &str) -> Result<Account, AuthError> {
        let claims = self.codec.decode(access_token).map_err(|e| {
            log::debug!(
                target: crate::LOG_TARGET,
                "msg=\"access token rejected\", reason=\"{e}\""
            );
            AuthError::Unauthorized
        })?;

        if claims.kind != TokenKind::Access {
            log::debug!(
                target: crate::LOG_TARGET,
                "msg=\"access token rejected\", reason=\"wrong kind\", kind=\"{}\"",
                claims.kind.as_str()
            );
            return Err(AuthError::Unauthorized);
        }

        let account_id = claims.account_id().map_err(|_| AuthError::Unauthorized)?;

        if self
            .access_denylist
            .contains(&claims.jti)
            .await
            .map_err(AuthError::sanitize)?
        {
            log::debug!(
                target: crate::LOG_TARGET,
                "msg=\"access token rejected\", reason=\"logged out\", account_id={account_id}"
            );
            return Err(AuthError::Unauthorized);
        }

        match self
            .accounts
            .find_account(account_id)
            .await
            .map_err(AuthError::sanitize)?
        {
            Some(account) if account.is_active => Ok(account),
            _ => Err(AuthError::Unauthorized),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::actions::test_support::codec;
    use crate::jwt::JwtConfig;
    use crate::repository::InMemoryJtiRegistry;
    use crate::MockAccountRepository;

    fn action(
        accounts: MockAccountRepository,
        denylist: InMemoryJtiRegistry,
    ) -> AuthenticateAction<MockAccountRepository, InMemoryJtiRegistry> {
        AuthenticateAction::new(accounts, denylist, codec())
    }

    fn accounts() -> MockAccountRepository {
        let accounts = MockAccountRepository::new();
        accounts.insert(Account::mock(42, "alice", "unused"));
        accounts
    }

    #[tokio::test]
    async fn test_valid_access_token() {
        let auth = action(accounts(), InMemoryJtiRegistry::new());
        let (token, _) = codec()
            .mint(42, TokenKind::Access, Duration::minutes(15))
            .unwrap();

        let account = auth.execute(&token).await.unwrap();
        assert_eq!(account.id, 42);
    }

    #[tokio::test]
    async fn test_rejections_are_unauthorized() {
        let auth = action(accounts(), InMemoryJtiRegistry::new());

        assert_eq!(auth.execute("garbage").await.unwrap_err(), AuthError::Unauthorized);

        let (refresh_kind, _) = codec()
            .mint(42, TokenKind::Refresh, Duration::minutes(15))
            .unwrap();
        assert_eq!(
            auth.execute(&refresh_kind).await.unwrap_err(),
            AuthError::Unauthorized
        );

        let (unknown_account, _) = codec()
            .mint(7, TokenKind::Access, Duration::minutes(15))
            .unwrap();
        assert_eq!(
            auth.execute(&unknown_account).await.unwrap_err(),
            AuthError::Unauthorized
        );

        let foreign = JwtCodec::new(JwtConfig::new("another-secret-32-bytes-long-key").unwrap());
        let (forged, _) = foreign
            .mint(42, TokenKind::Access, Duration::minutes(15))
            .unwrap();
        assert_eq!(auth.execute(&forged).await.unwrap_err(), AuthError::Unauthorized);
    }

    #[tokio::test]
    async fn test_denied_token_rejected() {
        let denylist = InMemoryJtiRegistry::new();
        let auth = action(accounts(), denylist.clone());
        let (token, claims) = codec()
            .mint(42, TokenKind::Access, Duration::minutes(15))
            .unwrap();

        denylist
            .insert(&claims.jti, claims.expires_at().unwrap())
            .await
            .unwrap();
        assert_eq!(auth.execute(&token).await.unwrap_err(), AuthError::Unauthorized);
    }

    #[tokio::test]
    async fn test_inactive_account_rejected() {
        let accounts = accounts();
        accounts.update(42, |a| a.is_active = false);
        let auth = action(accounts, InMemoryJtiRegistry::new());
        let (token, _) = codec()
            .mint(42, TokenKind::Access, Duration::minutes(15))
            .unwrap();

        assert_eq!(auth.execute(&token).await.unwrap_err(), AuthError::Unauthorized);
    }
}
