use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::database_error;
use crate::repository::JtiRegistry;
use crate::AuthError;

/// [`JtiRegistry`] over the `used_token_ids` table, partitioned by `scope`.
#[derive(Clone)]
pub struct PostgresJtiRegistry {
    pool: PgPool,
    scope: &'static str,
}

impl PostgresJtiRegistry {
    pub fn new(pool: PgPool, scope: &'static str) -> Self {
        Self { pool, scope }
    }

    pub fn email_actions(pool: PgPool) -> Self {
        Self::new(pool, "email_action")
    }

    pub fn access_denylist(pool: PgPool) -> Self {
        Self::new(pool, "access_denylist")
    }
}

#[async_trait]
impl JtiRegistry for PostgresJtiRegistry {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, err))]
    async fn insert(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<bool, AuthError> {
        let result = sqlx::query(
            r"INSERT INTO used_token_ids (scope, jti, expires_at) VALUES ($1, $2, $3)
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
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM used_token_ids WHERE scope = $1 AND jti = $2)",
        )
        .bind(self.scope)
        .bind(jti)
        .fetch_one(&self.pool)
        .await
        .map_err(database_error("jti_contains"))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn prune_expired(&self) -> Result<u64, AuthError> {
        let result =
            sqlx::query("DELETE FROM used_token_ids WHERE scope = $1 AND expires_at <= NOW()")
                .bind(self.scope)
                .execute(&self.pool)
                .await
                .map_err(database_error("jti_prune_expired"))?;

        Ok(result.rows_affected())
    }
}
