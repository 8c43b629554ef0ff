//! # Database Connection Pool
//!
//! SQLite pool for the library store. Connections run in WAL mode with
//! foreign keys enforced, and the embedded migrations under `migrations/`
//! are applied before the pool is handed out.
//!
//! ```rust,ignore
//! use core_library::db::{create_pool, DatabaseConfig};
//!
//! let pool = create_pool(DatabaseConfig::new("library.db")).await?;
//! let tracks = SqliteTrackRepository::new(pool.clone());
//! ```

use crate::{LibraryError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Pool settings for the library database
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// `sqlite:` URL of the database
    pub database_url: String,
    pub min_connections: u32,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Option<Duration>,
}

impl DatabaseConfig {
    /// Configuration for a database file, created on first use.
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        let path = database_path.into();

        Self {
            database_url: format!("sqlite:{}", path.display()),
            min_connections: 1,
            max_connections: 4,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
        }
    }

    /// Configuration for a private in-memory database.
    ///
    /// Each connection to `:memory:` sees its own database, so the pool is
    /// pinned to one connection that never idles out.
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            min_connections: 1,
            max_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: None,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }
}

/// Open the pool, run migrations and verify the connection.
pub async fn create_pool(config: DatabaseConfig) -> Result<Pool<Sqlite>> {
    info!(
        database_url = %config.database_url,
        max_connections = config.max_connections,
        "Opening library database"
    );

    let connect_options = SqliteConnectOptions::from_str(&config.database_url)?
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .create_if_missing(true)
        .pragma("cache_size", "-16000");

    let mut pool_options = SqlitePoolOptions::new()
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout);
    if config.idle_timeout.is_none() {
        pool_options = pool_options.max_lifetime(None);
    }

    let pool = pool_options
        .connect_with(connect_options)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to open library database");
            LibraryError::Database(e)
        })?;

    run_migrations(&pool).await?;
    health_check(&pool).await?;

    Ok(pool)
}

/// In-memory pool with the schema applied, for tests.
pub async fn create_test_pool() -> Result<Pool<Sqlite>> {
    create_pool(DatabaseConfig::in_memory()).await
}

async fn run_migrations(pool: &Pool<Sqlite>) -> Result<()> {
    debug!("Running database migrations");

    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Migration failed");
            LibraryError::Migration(e.to_string())
        })?;

    Ok(())
}

async fn health_check(pool: &Pool<Sqlite>) -> Result<()> {
    sqlx::query("SELECT 1").fetch_one(pool).await.map_err(|e| {
        warn!(error = %e, "Database health check failed");
        LibraryError::Database(e)
    })?;
    Ok(())
}
