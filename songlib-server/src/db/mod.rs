//! Database access layer for songlib-server
//!
//! Pool construction, table bootstrap, and the song store.

use anyhow::{Context, Result};
use songlib_common::config::DatabaseConfig;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

mod error;
mod filter;
mod songs;

pub use error::StoreError;
pub use filter::{FilterField, SongFilter, STATEMENT_SEPARATOR};
pub use songs::{SongRepository, SongStore};

/// Upper bound on how long SQLite waits on a locked database
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open the connection pool, creating the database file if needed
///
/// Every pooled connection has foreign keys enforced and runs in WAL mode.
/// Acquiring a connection and waiting on a locked database are both bounded
/// by the store operation timeout.
pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool> {
    if let Some(parent) = config.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory {}", parent.display())
            })?;
        }
    }

    let db_url = config.connection_url();
    tracing::debug!("Connecting to database: {}", db_url);

    let options = SqliteConnectOptions::from_str(&db_url)
        .context("Invalid database connection string")?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT.min(config.operation_timeout()));

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.operation_timeout())
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to connect to database {}", config.path.display()))?;

    info!(
        path = %config.path.display(),
        max_connections = config.max_connections,
        "Connected to database"
    );

    Ok(pool)
}

/// Create the catalog tables if they do not exist yet
///
/// Idempotent; safe to call on every startup.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS "groups" (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE CHECK (length(name) > 0)
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create groups table")?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS songs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL CHECK (length(name) > 0),
            group_id INTEGER NOT NULL REFERENCES "groups"(id),
            release_date TEXT NOT NULL DEFAULT '',
            lyrics TEXT NOT NULL DEFAULT '',
            link TEXT NOT NULL DEFAULT '',
            UNIQUE (name, group_id)
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create songs table")?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_songs_group_id ON songs(group_id)")
        .execute(pool)
        .await
        .context("Failed to create songs group index")?;

    info!("Database tables initialized (groups, songs)");

    Ok(())
}
