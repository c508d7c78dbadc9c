use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::AuthError;

/// Account as seen by the token core. Owned by the host application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn is_email_verified(&self) -> bool {
        self.email_verified_at.is_some()
    }
}

#[cfg(any(test, feature = "mocks"))]
impl Account {
    pub fn mock(id: i64, username: &str, hashed_password: &str) -> Self {
        Account {
            id,
            username: username.to_owned(),
            email: format!("{username}@example.com"),
            hashed_password: hashed_password.to_owned(),
            email_verified_at: Some(Utc::now()),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn unverified(mut self) -> Self {
        self.email_verified_at = None;
        self
    }

    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

/// Account collaborator supplied by the host application.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn find_account(&self, id: i64) -> Result<Option<Account>, AuthError>;

    /// Looks an account up by username or email.
    async fn find_account_by_login(&self, login: &str) -> Result<Option<Account>, AuthError>;

    async fn verify_password(&self, account: &Account, password: &str) -> Result<bool, AuthError>;

    async fn set_password(&self, account_id: i64, hashed_password: &str) -> Result<(), AuthError>;

    async fn mark_email_verified(&self, account_id: i64) -> Result<(), AuthError>;
}
