use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::database_error;
use crate::repository::JtiRegistry;
use crate::AuthError;

/// [`JtiRegistry`] over the `used_token_ids` table. Several registries share
/// the table, separated by `scope`.
#[derive(Clone)]
pub struct SqliteJtiRegistry {
    pool: SqlitePool,
    scope: &'static str,
}

impl SqliteJtiRegistry {
    pub fn new(pool: SqlitePool, scope: &'static str) -> Self {
        Self { pool, scope }
    }

    /// Consumed `verify_email` / `reset_password` tokens.
    pub fn email_actions(pool: SqlitePool) -> Self {
        Self::new(pool, "email_action")
    }

    /// Access tokens ended by logout.
    pub fn access_denylist(pool: SqlitePool) -> Self {
        Self::new(pool, "access_denylist")
    }
}

#[async_trait]
impl JtiRegistry for SqliteJtiRegistry {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, err))]
    async fn insert(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<bool, AuthError> {
        let result = sqlx::query(
            r"INSERT INTO used_token_ids (scope, jti, expires_at) VALUES (?, ?, ?)
               ON CONFLICT (scope, jti) DO NOTHING",
        )
        .bind(self.scope)
        .bind(jti)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(database_error("jti_insert"))?;

        Ok(result.rows_affected() == 1)
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, err))]
    async fn contains(&self, jti: &str) -> Result<bool, AuthError> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM used_token_ids WHERE scope = ? AND jti = ?)")
            .bind(self.scope)
            .bind(jti)
            .fetch_one(&self.pool)
            .await
            .map_err(database_error("jti_contains"))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn prune_expired(&self) -> Result<u64, AuthError> {
        let result = sqlx::query("DELETE FROM used_token_ids WHERE scope = ? AND expires_at <= ?")
            .bind(self.scope)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(database_error("jti_prune_expired"))?;

        Ok(result.rows_affected())
    }
}
