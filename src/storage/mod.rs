use anyhow::{Context as _, Result};
use sqlx::{sqlite::SqliteConnectOptions, ConnectOptions, SqlitePool};
use std::{path::Path, str::FromStr};

/// Default timeout for individual SQLite queries.
/// Prevents hung queries from blocking the daemon indefinitely.
const QUERY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Execute a future with the standard query timeout.
async fn with_timeout<T>(fut: impl std::future::Future<Output = Result<T>>) -> Result<T> {
    match tokio::time::timeout(QUERY_TIMEOUT, fut).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!(
            "database query timed out after {}s",
            QUERY_TIMEOUT.as_secs()
        )),
    }
}

#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    pub async fn new(data_dir: &Path) -> Result<Self> {
        Self::new_with_slow_query(data_dir, 0).await
    }

    /// Create storage with slow-query logging enabled.
    ///
    /// `slow_query_ms` is the threshold in milliseconds — queries exceeding it
    /// are logged at WARN level. Set to 0 to disable slow-query logging.
    pub async fn new_with_slow_query(data_dir: &Path, slow_query_ms: u64) -> Result<Self> {
        tokio::fs::create_dir_all(data_dir).await?;
        let db_path = data_dir.join("tandemd.db");
        let mut opts =
            SqliteConnectOptions::from_str(&format!("sqlite://{}?mode=rwc", db_path.display()))?
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .create_if_missing(true);

        if slow_query_ms > 0 {
            opts = opts.log_slow_statements(
                log::LevelFilter::Warn,
                std::time::Duration::from_millis(slow_query_ms),
            );
        }

        let pool = SqlitePool::connect_with(opts).await?;
        Self::migrate(&pool).await?;
        Ok(Self { pool })
    }

    /// In-memory storage for tests. Pinned to a single connection — a pooled
    /// `:memory:` database vanishes with the connection that created it.
    pub async fn memory() -> Result<Self> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await?;
        Self::migrate(&pool).await?;
        Ok(Self { pool })
    }

    /// Return a clone of the connection pool (cheap — Arc-backed).
    /// Feature storages (tasks, directory, notifications) share this pool.
    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    async fn migrate(pool: &SqlitePool) -> Result<()> {
        sqlx::migrate!("src/storage/migrations")
            .run(pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Quick liveness probe for the health endpoint.
    pub async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    // ─── Per-user preferences ───────────────────────────────────────────────

    pub async fn get_preference(&self, user_id: &str, key: &str) -> Result<Option<String>> {
        with_timeout(async {
            let row: Option<(String,)> = sqlx::query_as(
                "SELECT value FROM preferences WHERE user_id = ? AND key = ?",
            )
            .bind(user_id)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row.map(|(v,)| v))
        })
        .await
    }

    pub async fn set_preference(&self, user_id: &str, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO preferences (user_id, key, value) VALUES (?, ?, ?)
             ON CONFLICT(user_id, key) DO UPDATE SET value = excluded.value",
        )
        .bind(user_id)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
