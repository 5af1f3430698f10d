//! Opening the store: connection pool, pragmas and embedded migrations.

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

use crate::error::StorageError;

/// Connections kept open when the caller does not say otherwise.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Where the store lives and how many connections it may use.
pub struct Config {
    /// `SQLite` connection URL (e.g. `sqlite:smarthome.db?mode=rwc` or `sqlite::memory:`).
    pub database_url: String,
    /// Upper bound of the pool. Unrelated requests write concurrently.
    pub max_connections: u32,
}

impl Config {
    #[must_use]
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }

    /// Open the store and bring its schema up to date.
    ///
    /// File databases are created when missing and switched to WAL so
    /// readers do not block the writer. An in-memory database keeps one
    /// connection alive for the lifetime of the pool, otherwise its content
    /// would vanish with the last idle connection.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the URL is invalid, the connection fails
    /// or a migration cannot be applied.
    pub async fn open(self) -> Result<Database, StorageError> {
        let in_memory = self.database_url.contains(":memory:");
        let mut options = SqliteConnectOptions::from_str(&self.database_url)?.create_if_missing(true);
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(self.max_connections.max(1))
            .min_connections(u32::from(in_memory))
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!(
            database_url = %self.database_url,
            max_connections = self.max_connections,
            "store opened"
        );

        Ok(Database { pool })
    }
}

/// An open store. Repositories are built from clones of its pool.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Wait for in-flight queries, then close every connection.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::debug!("store closed");
    }
}
