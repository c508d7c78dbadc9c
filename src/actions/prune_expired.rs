//! run periodically (e.g. from a scheduled task) to keep the token tables bounded.

use crate::repository::{JtiRegistry, RefreshTokenRepository};
use crate::AuthError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneResult {
    pub refresh_tokens: u64,
    pub used_email_tokens: u64,
    pub denied_access_tokens: u64,
}

impl PruneResult {
    pub fn total(&self) -> u64 {
        self.refresh_tokens + self.used_email_tokens + self.denied_access_tokens
    }
}

pub struct PruneExpiredAction<R, E, D> {
    refresh_tokens: R,
    used_email_tokens: E,
    access_denylist: D,
}

impl<R, E, D> PruneExpiredAction<R, E, D>
where
    R: RefreshTokenRepository,
    E: JtiRegistry,
    D: JtiRegistry,
{
    pub fn new(refresh_tokens: R, used_email_tokens: E, access_denylist: D) -> Self {
        Self {
            refresh_tokens,
            used_email_tokens,
            access_denylist,
        }
    }

    /// Refresh records go once they are both expired and revoked; registry
    /// entries once their token has expired.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "prune_expired", skip_all, err)
    )]
    pub async fn execute(&self) -> Result<PruneResult, AuthError> {
        let refresh_tokens = self
            .refresh_tokens
            .prune_expired()
            .await
            .map_err(AuthError::sanitize)?;
        let used_email_tokens = self
            .used_email_tokens
            .prune_expired()
            .await
            .map_err(AuthError::sanitize)?;
        let denied_access_tokens = self
            .access_denylist
            .prune_expired()
            .await
            .map_err(AuthError::sanitize)?;

        log::info!(
            target: crate::LOG_TARGET,
            "msg=\"tokens pruned\", refresh_tokens={refresh_tokens}, used_email_tokens={used_email_tokens}, denied_access_tokens={denied_access_tokens}"
        );

        Ok(PruneResult {
            refresh_tokens,
            used_email_tokens,
            denied_access_tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::repository::{InMemoryJtiRegistry, SessionMetadata};
    use crate::MockRefreshTokenRepository;

    #[tokio::test]
    async fn test_prune_everything_expired() {
        let refresh_tokens = MockRefreshTokenRepository::new();
        let stale = refresh_tokens
            .issue(42, Duration::days(1), &SessionMetadata::default())
            .await
            .unwrap();
        let live = refresh_tokens
            .issue(42, Duration::days(1), &SessionMetadata::default())
            .await
            .unwrap();
        refresh_tokens.revoke(&stale.record.jti).await.unwrap();
        refresh_tokens.expire(&stale.record.jti);

        let used = InMemoryJtiRegistry::new();
        used.insert("burned", Utc::now() - Duration::minutes(1))
            .await
            .unwrap();
        used.insert("fresh", Utc::now() + Duration::minutes(1))
            .await
            .unwrap();

        let denied = InMemoryJtiRegistry::new();
        denied
            .insert("gone", Utc::now() - Duration::minutes(1))
            .await
            .unwrap();

        let action = PruneExpiredAction::new(refresh_tokens.clone(), used.clone(), denied.clone());
        let result = action.execute().await.unwrap();

        assert_eq!(
            result,
            PruneResult {
                refresh_tokens: 1,
                used_email_tokens: 1,
                denied_access_tokens: 1,
            }
        );
        assert_eq!(result.total(), 3);
        assert!(refresh_tokens.get(&live.record.jti).is_some());
        assert!(used.contains("fresh").await.unwrap());
    }

    #[tokio::test]
    async fn test_prune_nothing() {
        let action = PruneExpiredAction::new(
            MockRefreshTokenRepository::new(),
            InMemoryJtiRegistry::new(),
            InMemoryJtiRegistry::new(),
        );
        assert_eq!(action.execute().await.unwrap().total(), 0);
    }
}
