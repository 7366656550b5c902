//! Database access layer with connection pooling and migrations
//!
//! The database only stores insight history: every analysis run and the
//! ranked records it produced. Input tables stay in memory.
//!
//! - `insights` - Insight run history

use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

use crate::error::Result;

mod insights;

pub use insights::{InsightRun, StoredRun};

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// SQLite datetime format used for every stored timestamp
pub(crate) const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a SQLite datetime string into a DateTime<Utc>
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    chrono::NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
}

impl Database {
    /// Open (or create) the database at `path` and run migrations
    pub fn new(path: &str) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder().max_size(4).build(manager)?;

        let db = Self {
            pool,
            db_path: path.to_string(),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create a throwaway database (for testing)
    ///
    /// Uses a fresh temporary file rather than `:memory:` so that every
    /// pooled connection sees the same data.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "gramsales_test_{}_{}.db",
            std::process::id(),
            id
        ));

        // Remove any existing file
        let _ = std::fs::remove_file(&path);

        Self::new(&path.to_string_lossy())
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;

            -- One row per engine run
            CREATE TABLE IF NOT EXISTS insight_runs (
                id INTEGER PRIMARY KEY,
                generated_at DATETIME NOT NULL,
                record_count INTEGER NOT NULL,
                high_priority INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_insight_runs_generated ON insight_runs(generated_at);

            -- Ranked records of a run
            CREATE TABLE IF NOT EXISTS insight_records (
                id INTEGER PRIMARY KEY,
                run_id INTEGER NOT NULL REFERENCES insight_runs(id) ON DELETE CASCADE,
                position INTEGER NOT NULL,               -- rank within the run
                kind TEXT NOT NULL,                      -- saves_correlation, content_type, ...
                priority TEXT NOT NULL,                  -- high, medium, low
                title TEXT NOT NULL,
                message TEXT NOT NULL,
                recommended_action TEXT NOT NULL,
                supporting_data TEXT NOT NULL,           -- JSON: kind-specific payload
                simulated BOOLEAN NOT NULL DEFAULT 0,
                degraded BOOLEAN NOT NULL DEFAULT 0,
                generated_at DATETIME NOT NULL,
                UNIQUE(run_id, position)
            );

            CREATE INDEX IF NOT EXISTS idx_insight_records_run ON insight_records(run_id);
            "#,
        )?;

        info!("Database schema initialized");
        Ok(())
    }
}
