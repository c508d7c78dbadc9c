//! Embedded `SQLite` migrations.
//!
//! ```rust,ignore
//! use tessera::sqlite::migrations;
//!
//! migrations::run(&pool).await?;
//! ```

use sqlx::{Executor, SqlitePool};

const MIGRATIONS: &[(&str, &str)] = &[
    (
        "20250301000001_create_refresh_tokens_table",
        include_str!("../../migrations_sqlite/20250301000001_create_refresh_tokens_table.sql"),
    ),
    (
        "20250301000002_create_used_token_ids_table",
        include_str!("../../migrations_sqlite/20250301000002_create_used_token_ids_table.sql"),
    ),
];

/// Applies pending migrations, tracked in `_tessera_migrations`.
pub async fn run(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    pool.execute(
        r"
        CREATE TABLE IF NOT EXISTS _tessera_migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        )
        ",
    )
    .await?;

    for (name, sql) in MIGRATIONS {
        let applied: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM _tessera_migrations WHERE name = ?)")
                .bind(*name)
                .fetch_one(pool)
                .await?;

        if applied {
            continue;
        }

        // one statement per execute; the bundled files keep semicolons out of literals
        for statement in sql.split(';') {
            let trimmed = statement.trim();
            if !trimmed.is_empty() {
                pool.execute(trimmed).await?;
            }
        }

        sqlx::query("INSERT INTO _tessera_migrations (name) VALUES (?)")
            .bind(*name)
            .execute(pool)
            .await?;

        log::info!(
            target: crate::LOG_TARGET,
            "msg=\"migration applied\", name=\"{name}\""
        );
    }

    Ok(())
}
