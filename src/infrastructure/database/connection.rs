use anyhow::{Context, Result};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::str::FromStr;
use std::time::Duration;

/// Database connection pool manager
///
/// Manages the `SQLite` connection pool with WAL mode enabled for better
/// concurrency. Handles connection lifecycle, migrations, and configuration.
pub struct DatabaseConnection {
    pool: SqlitePool,
}

impl DatabaseConnection {
    /// Create a new database connection pool with WAL mode enabled.
    ///
    /// `database_url` is an `SQLite` URL, e.g. "sqlite:.haikubot/haikubot.db"
    /// or "sqlite::memory:".
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .context("invalid database URL")?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5))
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .context("failed to create connection pool")?;

        Ok(Self { pool })
    }

    /// Run database migrations at startup.
    ///
    /// Safe to call multiple times; only new migrations are applied.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("failed to run migrations")?;
        Ok(())
    }

    /// Get a reference to the connection pool.
    ///
    /// Use this to pass the pool to repository implementations.
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the connection pool gracefully during shutdown.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
