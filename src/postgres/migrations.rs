//! `PostgreSQL` migrations, embedded from `./migrations`.
//!
//! ```rust,ignore
//! use tessera::postgres::migrations;
//!
//! migrations::run(&pool).await?;
//! ```

use sqlx::PgPool;

/// Creates `refresh_tokens` and `used_token_ids`.
pub async fn run(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
