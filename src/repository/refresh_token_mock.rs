#![allow(clippy::unwrap_used)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::{Arc, Mutex};

use crate::crypto::hash_token;
use crate::AuthError;

use super::refresh_token::{
    IssuedRefreshToken, RefreshTokenRecord, RefreshTokenRepository, SessionMetadata,
};

/// In-memory refresh store. Every operation runs under a single lock, so
/// `rotate` has the same all-or-nothing behavior as the SQL backends.
#[derive(Clone, Default)]
pub struct MockRefreshTokenRepository {
    pub records: Arc<Mutex<Vec<RefreshTokenRecord>>>,
}

impl MockRefreshTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, jti: &str) -> Option<RefreshTokenRecord> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.jti == jti)
            .cloned()
    }

    /// Forces a record past its expiry.
    pub fn expire(&self, jti: &str) {
        let mut records = self.records.lock().unwrap();
        if let Some(record) = records.iter_mut().find(|r| r.jti == jti) {
            record.expires_at = Utc::now() - Duration::seconds(1);
        }
    }
}

#[async_trait]
impl RefreshTokenRepository for MockRefreshTokenRepository {
    async fn issue(
        &self,
        account_id: i64,
        ttl: Duration,
        metadata: &SessionMetadata,
    ) -> Result<IssuedRefreshToken, AuthError> {
        let issued = IssuedRefreshToken::generate(account_id, ttl, metadata)?;
        self.records.lock().unwrap().push(issued.record.clone());
        Ok(issued)
    }

    async fn find_by_token(&self, raw: &str) -> Result<Option<RefreshTokenRecord>, AuthError> {
        let hashed = hash_token(raw);
        let records = self.records.lock().unwrap();
        Ok(records.iter().find(|r| r.token_hash == hashed).cloned())
    }

    async fn rotate(
        &self,
        old_jti: &str,
        account_id: i64,
        ttl: Duration,
        metadata: &SessionMetadata,
    ) -> Result<IssuedRefreshToken, AuthError> {
        let mut records = self.records.lock().unwrap();

        let old = records
            .iter_mut()
            .find(|r| r.jti == old_jti && r.account_id == account_id && !r.revoked)
            .ok_or(AuthError::Revoked)?;

        let issued = IssuedRefreshToken::generate(account_id, ttl, metadata)?;
        old.revoked = true;
        old.revoked_at = Some(Utc::now());
        old.replaced_by = Some(issued.record.jti.clone());

        records.push(issued.record.clone());
        Ok(issued)
    }

    async fn revoke(&self, jti: &str) -> Result<(), AuthError> {
        let mut records = self.records.lock().unwrap();
        if let Some(record) = records.iter_mut().find(|r| r.jti == jti && !r.revoked) {
            record.revoked = true;
            record.revoked_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn revoke_all_for_account(&self, account_id: i64) -> Result<u64, AuthError> {
        let now = Utc::now();
        let mut records = self.records.lock().unwrap();
        let mut count = 0;
        for record in records
            .iter_mut()
            .filter(|r| r.account_id == account_id && !r.revoked)
        {
            record.revoked = true;
            record.revoked_at = Some(now);
            count += 1;
        }
        Ok(count)
    }

    async fn list_active_for_account(
        &self,
        account_id: i64,
    ) -> Result<Vec<RefreshTokenRecord>, AuthError> {
        let now = Utc::now();
        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .filter(|r| r.account_id == account_id && !r.revoked && r.expires_at > now)
            .cloned()
            .collect())
    }

    async fn prune_expired(&self) -> Result<u64, AuthError> {
        let now = Utc::now();
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| !(r.revoked && r.expires_at <= now));
        Ok((before - records.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::TokenState;

    #[tokio::test]
    async fn test_issue_and_validate() {
        let repo = MockRefreshTokenRepository::new();
        let issued = repo
            .issue(42, Duration::days(7), &SessionMetadata::default())
            .await
            .unwrap();

        let record = repo.validate(issued.raw.expose_secret()).await.unwrap();
        assert_eq!(record.jti, issued.record.jti);
        assert_eq!(record.account_id, 42);
    }

    #[tokio::test]
    async fn test_validate_unknown_and_expired() {
        let repo = MockRefreshTokenRepository::new();
        assert_eq!(repo.validate("nope").await, Err(AuthError::NotFound));

        let issued = repo
            .issue(42, Duration::days(7), &SessionMetadata::default())
            .await
            .unwrap();
        repo.expire(&issued.record.jti);
        assert_eq!(
            repo.validate(issued.raw.expose_secret()).await,
            Err(AuthError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_validate_revoked() {
        let repo = MockRefreshTokenRepository::new();
        let issued = repo
            .issue(42, Duration::days(7), &SessionMetadata::default())
            .await
            .unwrap();
        repo.revoke(&issued.record.jti).await.unwrap();
        repo.revoke(&issued.record.jti).await.unwrap();

        assert_eq!(
            repo.validate(issued.raw.expose_secret()).await,
            Err(AuthError::Revoked)
        );
    }

    #[tokio::test]
    async fn test_rotate_links_successor() {
        let repo = MockRefreshTokenRepository::new();
        let metadata = SessionMetadata::new(Some("10.0.0.1".to_owned()), None);
        let first = repo.issue(42, Duration::days(7), &metadata).await.unwrap();

        let second = repo
            .rotate(&first.record.jti, 42, Duration::days(7), &metadata)
            .await
            .unwrap();

        let old = repo.get(&first.record.jti).unwrap();
        assert_eq!(old.state(), TokenState::Rotated);
        assert_eq!(old.replaced_by.as_deref(), Some(second.record.jti.as_str()));
        assert_eq!(second.record.ip_address.as_deref(), Some("10.0.0.1"));

        let again = repo
            .rotate(&first.record.jti, 42, Duration::days(7), &metadata)
            .await;
        assert_eq!(again.err(), Some(AuthError::Revoked));
        assert_eq!(repo.records.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_rotate_wrong_account() {
        let repo = MockRefreshTokenRepository::new();
        let first = repo
            .issue(42, Duration::days(7), &SessionMetadata::default())
            .await
            .unwrap();

        let result = repo
            .rotate(&first.record.jti, 7, Duration::days(7), &SessionMetadata::default())
            .await;
        assert_eq!(result.err(), Some(AuthError::Revoked));
        assert_eq!(repo.get(&first.record.jti).unwrap().state(), TokenState::Active);
    }

    #[tokio::test]
    async fn test_rotate_unrepresentable_ttl_leaves_storage_untouched() {
        let repo = MockRefreshTokenRepository::new();
        let first = repo
            .issue(42, Duration::days(7), &SessionMetadata::default())
            .await
            .unwrap();

        let result = repo
            .rotate(
                &first.record.jti,
                42,
                Duration::days(1_000_000_000),
                &SessionMetadata::default(),
            )
            .await;
        assert!(matches!(result, Err(AuthError::ConfigurationError(_))));
        assert_eq!(repo.get(&first.record.jti).unwrap().state(), TokenState::Active);
        assert_eq!(repo.records.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_rotate_single_winner() {
        let repo = MockRefreshTokenRepository::new();
        let first = repo
            .issue(42, Duration::days(7), &SessionMetadata::default())
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let repo = repo.clone();
            let jti = first.record.jti.clone();
            handles.push(tokio::spawn(async move {
                repo.rotate(&jti, 42, Duration::days(7), &SessionMetadata::default())
                    .await
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(repo.list_active_for_account(42).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_revoke_all_and_list_active() {
        let repo = MockRefreshTokenRepository::new();
        for _ in 0..3 {
            repo.issue(42, Duration::days(7), &SessionMetadata::default())
                .await
                .unwrap();
        }
        repo.issue(7, Duration::days(7), &SessionMetadata::default())
            .await
            .unwrap();

        assert_eq!(repo.list_active_for_account(42).await.unwrap().len(), 3);
        assert_eq!(repo.revoke_all_for_account(42).await.unwrap(), 3);
        assert_eq!(repo.revoke_all_for_account(42).await.unwrap(), 0);
        assert!(repo.list_active_for_account(42).await.unwrap().is_empty());
        assert_eq!(repo.list_active_for_account(7).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_prune_only_expired_and_revoked() {
        let repo = MockRefreshTokenRepository::new();
        let meta = SessionMetadata::default();
        let expired_revoked = repo.issue(1, Duration::days(1), &meta).await.unwrap();
        let expired_only = repo.issue(1, Duration::days(1), &meta).await.unwrap();
        let revoked_only = repo.issue(1, Duration::days(1), &meta).await.unwrap();

        repo.revoke(&expired_revoked.record.jti).await.unwrap();
        repo.expire(&expired_revoked.record.jti);
        repo.expire(&expired_only.record.jti);
        repo.revoke(&revoked_only.record.jti).await.unwrap();

        assert_eq!(repo.prune_expired().await.unwrap(), 1);
        assert!(repo.get(&expired_revoked.record.jti).is_none());
        assert!(repo.get(&expired_only.record.jti).is_some());
        assert!(repo.get(&revoked_only.record.jti).is_some());
    }
}
