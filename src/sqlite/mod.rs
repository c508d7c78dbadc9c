//! `SQLite` backends for the refresh store and the jti registries.
//!
//! Enable the `sqlx_sqlite` feature to use these implementations.

mod jti_registry;
pub mod migrations;
mod refresh_token;

pub use jti_registry::SqliteJtiRegistry;
pub use refresh_token::SqliteRefreshTokenRepository;

use sqlx::SqlitePool;

use crate::AuthError;

/// Creates the refresh store plus the email action and access denylist
/// registries over one pool.
pub fn create_repositories(
    pool: SqlitePool,
) -> (SqliteRefreshTokenRepository, SqliteJtiRegistry, SqliteJtiRegistry) {
    (
        SqliteRefreshTokenRepository::new(pool.clone()),
        SqliteJtiRegistry::email_actions(pool.clone()),
        SqliteJtiRegistry::access_denylist(pool),
    )
}

fn database_error(operation: &'static str) -> impl Fn(sqlx::Error) -> AuthError {
    move |e| {
        log::error!(
            target: crate::LOG_TARGET,
            "msg=\"database error\", operation=\"{operation}\", error=\"{e}\""
        );
        AuthError::DatabaseError(e.to_string())
    }
}
