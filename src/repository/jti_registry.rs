use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

use crate::AuthError;

/// Set of token ids, each kept until its token would have expired anyway.
///
/// Used twice: to burn consumed email action tokens and to deny access
/// tokens after logout.
#[async_trait]
pub trait JtiRegistry: Send + Sync {
    /// Records `jti` unless it is already present.
    ///
    /// Returns `false` if it was already recorded. Must be atomic: of two
    /// concurrent inserts of the same jti exactly one returns `true`.
    async fn insert(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<bool, AuthError>;

    async fn contains(&self, jti: &str) -> Result<bool, AuthError>;

    /// Drops entries whose expiry has passed. Returns how many were dropped.
    async fn prune_expired(&self) -> Result<u64, AuthError>;
}

/// Process-local registry.
///
/// for more than one process, use the sqlite or postgres registry
#[derive(Debug, Clone, Default)]
pub struct InMemoryJtiRegistry {
    entries: Arc<RwLock<HashMap<String, DateTime<Utc>>>>,
}

impl InMemoryJtiRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl JtiRegistry for InMemoryJtiRegistry {
    async fn insert(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<bool, AuthError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| AuthError::DatabaseError("Failed to acquire lock".to_owned()))?;

        if entries.contains_key(jti) {
            return Ok(false);
        }

        entries.insert(jti.to_owned(), expires_at);
        Ok(true)
    }

    async fn contains(&self, jti: &str) -> Result<bool, AuthError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| AuthError::DatabaseError("Failed to acquire lock".to_owned()))?;

        Ok(entries.contains_key(jti))
    }

    async fn prune_expired(&self) -> Result<u64, AuthError> {
        let now = Utc::now();
        let mut entries = self
            .entries
            .write()
            .map_err(|_| AuthError::DatabaseError("Failed to acquire lock".to_owned()))?;

        let before = entries.len();
        entries.retain(|_, expires_at| *expires_at > now);
        Ok((before - entries.len()) as u64)
    }
}

/// Prunes `registry` every `period` on the current tokio runtime.
///
/// Abort the returned handle to stop it.
pub fn spawn_janitor<R>(registry: R, period: Duration) -> JoinHandle<()>
where
    R: JtiRegistry + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            match registry.prune_expired().await {
                Ok(0) => {}
                Ok(pruned) => log::debug!(
                    target: crate::LOG_TARGET,
                    "msg=\"pruned used token ids\", count={pruned}"
                ),
                Err(e) => log::warn!(
                    target: crate::LOG_TARGET,
                    "msg=\"jti registry prune failed\", error=\"{e}\""
                ),
            }
        }
    })
}
