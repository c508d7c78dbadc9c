use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use super::database_error;
use crate::crypto::hash_token;
use crate::repository::{
    IssuedRefreshToken, RefreshTokenRecord, RefreshTokenRepository, SessionMetadata,
};
use crate::AuthError;

#[derive(Clone)]
pub struct SqliteRefreshTokenRepository {
    pool: SqlitePool,
}

impl SqliteRefreshTokenRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

async fn insert(conn: &mut SqliteConnection, record: &RefreshTokenRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        r"INSERT INTO refresh_tokens
           (jti, account_id, token_hash, created_at, expires_at, revoked, ip_address, user_agent)
           VALUES (?, ?, ?, ?, ?, 0, ?, ?)",
    )
    .bind(&record.jti)
    .bind(record.account_id)
    .bind(&record.token_hash)
    .bind(record.created_at)
    .bind(record.expires_at)
    .bind(&record.ip_address)
    .bind(&record.user_agent)
    .execute(conn)
    .await?;
    Ok(())
}

#[async_trait]
impl RefreshTokenRepository for SqliteRefreshTokenRepository {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, metadata), err))]
    async fn issue(
        &self,
        account_id: i64,
        ttl: Duration,
        metadata: &SessionMetadata,
    ) -> Result<IssuedRefreshToken, AuthError> {
        let issued = IssuedRefreshToken::generate(account_id, ttl, metadata)?;

        let mut conn = self.pool.acquire().await.map_err(database_error("issue"))?;
        insert(&mut *conn, &issued.record)
            .await
            .map_err(database_error("issue"))?;

        Ok(issued)
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, err))]
    async fn find_by_token(&self, raw: &str) -> Result<Option<RefreshTokenRecord>, AuthError> {
        sqlx::query_as::<_, RefreshTokenRecord>(
            r"SELECT jti, account_id, token_hash, created_at, expires_at, revoked,
                      revoked_at, replaced_by, ip_address, user_agent
               FROM refresh_tokens WHERE token_hash = ?",
        )
        .bind(hash_token(raw))
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error("find_by_token"))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, metadata), err))]
    async fn rotate(
        &self,
        old_jti: &str,
        account_id: i64,
        ttl: Duration,
        metadata: &SessionMetadata,
    ) -> Result<IssuedRefreshToken, AuthError> {
        let issued = IssuedRefreshToken::generate(account_id, ttl, metadata)?;

        let mut tx = self.pool.begin().await.map_err(database_error("rotate"))?;

        let result = sqlx::query(
            r"UPDATE refresh_tokens
               SET revoked = 1, revoked_at = ?, replaced_by = ?
               WHERE jti = ? AND account_id = ? AND revoked = 0",
        )
        .bind(Utc::now())
        .bind(&issued.record.jti)
        .bind(old_jti)
        .bind(account_id)
        .execute(&mut *tx)
        .await
        .map_err(database_error("rotate"))?;

        if result.rows_affected() != 1 {
            tx.rollback().await.map_err(database_error("rotate"))?;
            return Err(AuthError::Revoked);
        }

        insert(&mut *tx, &issued.record)
            .await
            .map_err(database_error("rotate"))?;
        tx.commit().await.map_err(database_error("rotate"))?;

        Ok(issued)
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn revoke(&self, jti: &str) -> Result<(), AuthError> {
        sqlx::query("UPDATE refresh_tokens SET revoked = 1, revoked_at = ? WHERE jti = ? AND revoked = 0")
            .bind(Utc::now())
            .bind(jti)
            .execute(&self.pool)
            .await
            .map_err(database_error("revoke"))?;
        Ok(())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn revoke_all_for_account(&self, account_id: i64) -> Result<u64, AuthError> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked = 1, revoked_at = ? WHERE account_id = ? AND revoked = 0",
        )
        .bind(Utc::now())
        .bind(account_id)
        .execute(&self.pool)
        .await
        .map_err(database_error("revoke_all_for_account"))?;

        Ok(result.rows_affected())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn list_active_for_account(
        &self,
        account_id: i64,
    ) -> Result<Vec<RefreshTokenRecord>, AuthError> {
        sqlx::query_as::<_, RefreshTokenRecord>(
            r"SELECT jti, account_id, token_hash, created_at, expires_at, revoked,
                      revoked_at, replaced_by, ip_address, user_agent
               FROM refresh_tokens
               WHERE account_id = ? AND revoked = 0 AND expires_at > ?
               ORDER BY created_at",
        )
        .bind(account_id)
        .bind(Utc::now())
        .fetch_all(&self.pool)
        .await
        .map_err(database_error("list_active_for_account"))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn prune_expired(&self) -> Result<u64, AuthError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE revoked = 1 AND expires_at <= ?")
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(database_error("prune_expired"))?;

        Ok(result.rows_affected())
    }
}
