//! Database connection and pool management.

use exn::ResultExt;
use sqlx::SqliteConnection;
use sqlx::pool::PoolConnectionMetadata;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use std::path::Path;
use tracing::instrument;

use crate::error::{ErrorKind, Result};

// One writer at a time in practice (the crawl loop is single-flight), so a
// couple of connections cover any overlapping reads.
const MAX_CONNECTIONS: u32 = 2;

/// Database connection pool for the episode store.
///
/// This is the main entry point for interacting with the store. It manages
/// the SQLite connection pool; operations check a connection out of the pool
/// for the duration of one call and return it on every exit path.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    async fn new(options: SqliteConnectOptions, max: Option<u32>) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            // This is IMPORTANT to apply the query-based PRAGMAs to EVERY
            // connection (set by max connections) instead of only the
            // first connection returned by the pool.
            .after_connect(|conn, meta| Box::pin(async move {
                Self::apply_pragmas(conn, meta).await
            }))
            .max_connections(max.unwrap_or(MAX_CONNECTIONS))
            .connect_with(options)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(Self { pool })
    }

    /// Connect to the store database at the given path.
    ///
    /// Creates the database file if it doesn't exist. A fresh file has no
    /// schema until [`setup_schema`](Self::setup_schema) is called.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let options = Self::base_options().filename(path).create_if_missing(true);
        Self::new(options, None).await
    }

    /// Connect to an in-memory database (useful for testing).
    ///
    /// Note:
    /// - In-memory databases are destroyed when the connection closes.
    /// - Do NOT apply `#[cfg(test)]` so that other crates can also use this in their tests.
    pub async fn connect_in_memory() -> Result<Self> {
        let options = Self::base_options().filename(":memory:");
        // In-memory database must either use the same cache `.shared_cache(true)`,
        // or be limited to one connection. Otherwise parallel connections will
        // see different databases that contain different data.
        Self::new(options, Some(1)).await
    }

    /// Base connection options shared between file and in-memory databases.
    fn base_options() -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            // Enable WAL mode for better concurrent read performance
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            // Foreign key enforcement
            .foreign_keys(true)
            // PRAGMA synchronous = NORMAL (balance between safety and speed)
            .synchronous(SqliteSynchronous::Normal)
            // PRAGMA busy_timeout = 1500ms
            .busy_timeout(std::time::Duration::from_millis(1500))
    }

    /// Apply additional PRAGMA settings that aren't exposed via SqliteConnectOptions.
    async fn apply_pragmas(conn: &mut SqliteConnection, _meta: PoolConnectionMetadata) -> sqlx::Result<()> {
        sqlx::query(
            r#"
                PRAGMA locking_mode = NORMAL;
                PRAGMA cache_size = -8192;
                PRAGMA temp_store = MEMORY;
            "#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    /// (Re)create the two episode tables, discarding any existing rows.
    ///
    /// Destructive: both tables are dropped first. This is only ever called
    /// on a brand-new database file or on an explicit reset request, never as
    /// part of normal operation.
    #[instrument(name = "initializing store schema", skip(self))]
    pub async fn setup_schema(&self) -> Result<()> {
        sqlx::query(include_str!("../queries/schema.sql"))
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Schema)?;
        Ok(())
    }

    /// Get a reference to the underlying connection pool.
    ///
    /// This is useful for running custom queries or transactions.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    ///
    /// This waits for all connections to be returned to the pool and then
    /// closes them. After calling this, the Database instance should not
    /// be used.
    pub async fn close(&self) {
        // Let SQLite update query planner statistics
        _ = sqlx::query("PRAGMA optimize").execute(&self.pool).await;
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_in_memory() {
        let db = Database::connect_in_memory().await.unwrap();
        assert!(!db.pool().is_closed());
        db.close().await;
    }

    #[tokio::test]
    async fn test_setup_schema_creates_both_tables() {
        let db = Database::connect_in_memory().await.unwrap();
        db.setup_schema().await.unwrap();
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM meta").fetch_one(db.pool()).await.unwrap();
        assert_eq!(count.0, 0);
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM audio").fetch_one(db.pool()).await.unwrap();
        assert_eq!(count.0, 0);
        db.close().await;
    }

    #[tokio::test]
    async fn test_setup_schema_discards_existing_rows() {
        let db = Database::connect_in_memory().await.unwrap();
        db.setup_schema().await.unwrap();
        sqlx::query("INSERT INTO audio (uid, file_path, duration, frame_rate, frame_width) VALUES (1, 'x', 1, 1, 1)")
            .execute(db.pool())
            .await
            .unwrap();
        db.setup_schema().await.unwrap();
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM audio").fetch_one(db.pool()).await.unwrap();
        assert_eq!(count.0, 0);
        db.close().await;
    }

    #[tokio::test]
    async fn test_pragmas_are_applied() {
        let db = Database::connect_in_memory().await.unwrap();
        let row: (i64,) = sqlx::query_as("PRAGMA foreign_keys").fetch_one(db.pool()).await.unwrap();
        assert_eq!(row.0, 1, "foreign_keys should be ON");
        db.close().await;
    }
}
