//! Database connection management.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::error::DbResult;

/// Handle to the users database.
///
/// Holds the connection pool shared by every request. Cloning is cheap and
/// all clones share the same pool.
#[derive(Debug, Clone)]
pub struct UsersDb {
    pool: SqlitePool,
}

impl UsersDb {
    /// Connect using a connection string such as `sqlite://flow-users.db`.
    ///
    /// The database file is created if missing and pending migrations are
    /// applied before the handle is returned.
    pub async fn connect(url: &str) -> DbResult<Self> {
        info!("Connecting to users database: {}", redact_url(url));

        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        Self::open_with(options, SqlitePoolOptions::new().max_connections(5)).await
    }

    /// Open an in-memory database (for testing).
    pub async fn open_in_memory() -> DbResult<Self> {
        let options = SqliteConnectOptions::new().filename(":memory:");

        // In-memory must be a single connection that is never recycled,
        // otherwise the database goes with it
        let pool_options = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
        Self::open_with(options, pool_options).await
    }

    async fn open_with(
        options: SqliteConnectOptions,
        pool_options: SqlitePoolOptions,
    ) -> DbResult<Self> {
        let options = options
            .journal_mode(SqliteJournalMode::Wal)
            .pragma("synchronous", "NORMAL") // Safe with WAL
            .pragma("temp_store", "MEMORY")
            .foreign_keys(true);

        let pool = pool_options.connect_with(options).await?;

        debug!("Users database connection established");

        Self::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    /// Run database migrations.
    async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
        debug!("Running users database migrations");
        sqlx::migrate!("./migrations").run(pool).await?;
        info!("Users database migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Check if the database is healthy.
    pub async fn health_check(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Strip credentials from a connection string before logging it.
fn redact_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://********{}", &url[..scheme_end], &url[at..])
        }
        _ => url.to_string(),
    }
}
