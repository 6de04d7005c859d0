//! Versioned schema migrations for the cache metadata store.
//!
//! Applied versions are recorded in `_migrations`. A migration's SQL and its
//! version row commit in the same transaction, so a schema change is never
//! applied without being recorded.

use super::Error;
use tokio_rusqlite::{Connection, params, rusqlite};

/// Ordered (version, SQL) pairs. Versions strictly increase.
const MIGRATIONS: &[(i64, &str)] = &[(1, include_str!("../../migrations/001_cached_items.sql"))];

/// Apply every migration newer than the recorded version.
///
/// # Errors
///
/// Returns `Error::MigrationFailed` naming the version whose SQL failed; that
/// version and every later one stay unapplied.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    apply_pending(conn, MIGRATIONS).await
}

async fn apply_pending(conn: &Connection, migrations: &'static [(i64, &'static str)]) -> Result<(), Error> {
    let applied = conn
        .call(move |conn| -> Result<Vec<i64>, Error> {
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS _migrations (
                    version INTEGER PRIMARY KEY,
                    applied_at TEXT NOT NULL
                )",
            )?;
            let current: i64 =
                conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;

            let mut applied = Vec::new();
            for &(version, sql) in migrations.iter().filter(|(version, _)| *version > current) {
                apply(conn, version, sql).map_err(|e| Error::MigrationFailed(format!("version {version}: {e}")))?;
                applied.push(version);
            }
            Ok(applied)
        })
        .await?;

    if !applied.is_empty() {
        tracing::info!(?applied, "cache schema migrated");
    }
    Ok(())
}

fn apply(conn: &mut rusqlite::Connection, version: i64, sql: &str) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(sql)?;
    tx.execute(
        "INSERT INTO _migrations (version, applied_at) VALUES (?1, ?2)",
        params![version, chrono::Utc::now().to_rfc3339()],
    )?;
    tx.commit()
}
