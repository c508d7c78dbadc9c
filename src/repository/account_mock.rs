#![allow(clippy::unwrap_used)]

use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, Mutex};

use crate::crypto::{Argon2Hasher, PasswordHasher};
use crate::AuthError;

use super::account::{Account, AccountRepository};

#[derive(Clone, Default)]
pub struct MockAccountRepository {
    pub accounts: Arc<Mutex<Vec<Account>>>,
}

impl MockAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an account with `password` hashed through Argon2.
    pub fn with_account(self, id: i64, username: &str, password: &str) -> Self {
        let hashed = Argon2Hasher::default().hash(password).unwrap();
        self.insert(Account::mock(id, username, &hashed));
        self
    }

    pub fn insert(&self, account: Account) {
        self.accounts.lock().unwrap().push(account);
    }

    pub fn get(&self, id: i64) -> Option<Account> {
        self.accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned()
    }

    pub fn update(&self, id: i64, f: impl FnOnce(&mut Account)) {
        let mut accounts = self.accounts.lock().unwrap();
        if let Some(account) = accounts.iter_mut().find(|a| a.id == id) {
            f(account);
        }
    }
}

#[async_trait]
impl AccountRepository for MockAccountRepository {
    async fn find_account(&self, id: i64) -> Result<Option<Account>, AuthError> {
        Ok(self.get(id))
    }

    async fn find_account_by_login(&self, login: &str) -> Result<Option<Account>, AuthError> {
        let accounts = self.accounts.lock().unwrap();
        Ok(accounts
            .iter()
            .find(|a| a.username == login || a.email.eq_ignore_ascii_case(login))
            .cloned())
    }

    async fn verify_password(&self, account: &Account, password: &str) -> Result<bool, AuthError> {
        Argon2Hasher::default().verify(password, &account.hashed_password)
    }

    async fn set_password(&self, account_id: i64, hashed_password: &str) -> Result<(), AuthError> {
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts
            .iter_mut()
            .find(|a| a.id == account_id)
            .ok_or(AuthError::NotFound)?;
        hashed_password.clone_into(&mut account.hashed_password);
        Ok(())
    }

    async fn mark_email_verified(&self, account_id: i64) -> Result<(), AuthError> {
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts
            .iter_mut()
            .find(|a| a.id == account_id)
            .ok_or(AuthError::NotFound)?;
        account.email_verified_at = Some(Utc::now());
        Ok(())
    }
}
