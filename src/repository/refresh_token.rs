use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::{generate_jti, generate_token, hash_token, REFRESH_TOKEN_LENGTH};
use crate::{AuthError, SecretString};

/// Where a refresh token sits in its lineage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenState {
    Active,
    /// Revoked because a successor was issued.
    Rotated,
    /// Revoked without a successor. Terminal.
    Revoked,
    Expired,
}

/// Client details recorded alongside a refresh token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl SessionMetadata {
    pub fn new(ip_address: Option<String>, user_agent: Option<String>) -> Self {
        Self {
            ip_address,
            user_agent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(
    any(feature = "sqlx_sqlite", feature = "sqlx_postgres"),
    derive(sqlx::FromRow)
)]
pub struct RefreshTokenRecord {
    pub jti: String,
    pub account_id: i64,
    /// SHA-256 hex of the raw token.
    #[serde(skip_serializing)]
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
    pub revoked_at: Option<DateTime<Utc>>,
    /// jti of the successor, set on rotation.
    pub replaced_by: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl RefreshTokenRecord {
    pub fn state_at(&self, now: DateTime<Utc>) -> TokenState {
        if self.revoked {
            if self.replaced_by.is_some() {
                TokenState::Rotated
            } else {
                TokenState::Revoked
            }
        } else if now >= self.expires_at {
            TokenState::Expired
        } else {
            TokenState::Active
        }
    }

    pub fn state(&self) -> TokenState {
        self.state_at(Utc::now())
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// A freshly issued refresh token. `raw` is returned to the client exactly
/// once and never stored.
#[derive(Debug, Clone)]
pub struct IssuedRefreshToken {
    pub raw: SecretString,
    pub record: RefreshTokenRecord,
}

impl IssuedRefreshToken {
    /// Builds a new active record and its raw token. Backends persist
    /// `record` as-is.
    ///
    /// Fails with `ConfigurationError` when `ttl` pushes the expiry out of
    /// range.
    pub(crate) fn generate(
        account_id: i64,
        ttl: Duration,
        metadata: &SessionMetadata,
    ) -> Result<Self, AuthError> {
        let now = Utc::now();
        let expires_at = now.checked_add_signed(ttl).ok_or_else(|| {
            AuthError::ConfigurationError("refresh token lifetime out of range".to_owned())
        })?;
        let raw = generate_token(REFRESH_TOKEN_LENGTH);

        let record = RefreshTokenRecord {
            jti: generate_jti(),
            account_id,
            token_hash: hash_token(&raw),
            created_at: now,
            expires_at,
            revoked: false,
            revoked_at: None,
            replaced_by: None,
            ip_address: metadata.ip_address.clone(),
            user_agent: metadata.user_agent.clone(),
        };

        Ok(Self {
            raw: SecretString::new(raw),
            record,
        })
    }
}

/// Server-side refresh token store. Only hashes of raw tokens are persisted.
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    async fn issue(
        &self,
        account_id: i64,
        ttl: Duration,
        metadata: &SessionMetadata,
    ) -> Result<IssuedRefreshToken, AuthError>;

    /// Looks a record up by the hash of `raw`, whatever its state.
    async fn find_by_token(&self, raw: &str) -> Result<Option<RefreshTokenRecord>, AuthError>;

    /// `NotFound` if there is no matching, non-expired record, `Revoked` if
    /// the record is revoked.
    async fn validate(&self, raw: &str) -> Result<RefreshTokenRecord, AuthError> {
        let record = self.find_by_token(raw).await?.ok_or(AuthError::NotFound)?;

        if record.revoked {
            return Err(AuthError::Revoked);
        }
        if record.is_expired() {
            return Err(AuthError::NotFound);
        }

        Ok(record)
    }

    /// Atomically revokes `old_jti` (which must belong to `account_id` and
    /// not be revoked yet) and stores its successor.
    ///
    /// Fails with `Revoked` and leaves storage untouched if the conditional
    /// revoke does not affect exactly one record.
    async fn rotate(
        &self,
        old_jti: &str,
        account_id: i64,
        ttl: Duration,
        metadata: &SessionMetadata,
    ) -> Result<IssuedRefreshToken, AuthError>;

    /// Idempotent.
    async fn revoke(&self, jti: &str) -> Result<(), AuthError>;

    /// Returns how many records were revoked.
    async fn revoke_all_for_account(&self, account_id: i64) -> Result<u64, AuthError>;

    async fn list_active_for_account(
        &self,
        account_id: i64,
    ) -> Result<Vec<RefreshTokenRecord>, AuthError>;

    /// Deletes records that are both expired and revoked.
    async fn prune_expired(&self) -> Result<u64, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> RefreshTokenRecord {
        IssuedRefreshToken::generate(42, Duration::days(7), &SessionMetadata::default())
            .unwrap()
            .record
    }

    #[test]
    fn test_generate_stores_hash_only() {
        let issued =
            IssuedRefreshToken::generate(42, Duration::days(7), &SessionMetadata::default()).unwrap();
        assert_eq!(issued.raw.len(), REFRESH_TOKEN_LENGTH);
        assert_eq!(issued.record.token_hash, hash_token(issued.raw.expose_secret()));
        assert_ne!(issued.record.token_hash, issued.raw.expose_secret());
        assert_eq!(issued.record.state(), TokenState::Active);
    }

    #[test]
    fn test_states() {
        let now = Utc::now();

        let mut r = record();
        assert_eq!(r.state_at(now + Duration::days(8)), TokenState::Expired);

        r.revoked = true;
        assert_eq!(r.state_at(now), TokenState::Revoked);

        r.replaced_by = Some("next".to_owned());
        assert_eq!(r.state_at(now), TokenState::Rotated);
    }

    #[test]
    fn test_generate_rejects_unrepresentable_lifetime() {
        let result = IssuedRefreshToken::generate(
            42,
            Duration::days(1_000_000_000),
            &SessionMetadata::default(),
        );
        assert!(matches!(result, Err(AuthError::ConfigurationError(_))));
    }

    #[test]
    fn test_token_hash_not_serialized() {
        let json = serde_json::to_value(record()).unwrap();
        assert!(json.get("token_hash").is_none());
        assert_eq!(json["account_id"], 42);
    }
}
