//! Embedded SQL migration runner.
//!
//! Migrations are SQL files embedded at compile time. They run sequentially
//! on startup, tracked by the `_fleetstat_migrations` table. Each migration
//! runs exactly once — if it has already been applied, it is skipped.

use crate::client::PostgresClient;
use anyhow::Result;
use tracing::{debug, info};

/// A single embedded migration.
struct Migration {
    name: &'static str,
    sql: &'static str,
}

/// All migrations in order. New migrations are appended here.
const MIGRATIONS: &[Migration] = &[Migration {
    name: "000_statuses",
    sql: include_str!("migrations/000_statuses.sql"),
}];

/// Applies any pending migrations, in order.
pub async fn run_migrations(client: &PostgresClient) -> Result<()> {
    let conn = client.get_connection().await?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS _fleetstat_migrations (
            name TEXT PRIMARY KEY,
            applied_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )",
        &[],
    )
    .await?;

    for migration in MIGRATIONS {
        let applied = conn
            .query_opt(
                "SELECT name FROM _fleetstat_migrations WHERE name = $1",
                &[&migration.name],
            )
            .await?;

        if applied.is_some() {
            debug!(migration = migration.name, "migration already applied");
            continue;
        }

        conn.batch_execute(migration.sql).await?;
        conn.execute(
            "INSERT INTO _fleetstat_migrations (name) VALUES ($1)",
            &[&migration.name],
        )
        .await?;

        info!(migration = migration.name, "applied migration");
    }

    Ok(())
}
