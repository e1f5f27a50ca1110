//! SQLite-backed ledger document store.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Row, SqlitePool};
use tokio::runtime::Runtime;
use tokio::sync::Mutex;

use cloudpos_ledger::Ledger;

use crate::store::{decode_ledger, encode_ledger, LedgerStore, LEDGER_STORAGE_KEY};

/// SQLite-backed store holding the ledger as one JSON document row.
///
/// The table is a plain key/document mapping so the whole-ledger overwrite
/// contract maps to a single upsert. The pool is initialized lazily on first
/// use; the public API is synchronous (persistence blocks the triggering
/// operation, per the single-writer model) and wraps a one-off runtime.
#[derive(Debug, Clone)]
pub struct SqliteLedgerStore {
    pool: Arc<Mutex<Option<SqlitePool>>>,
    db_path: PathBuf,
}

impl SqliteLedgerStore {
    /// Create a store at the default OS data-dir location
    /// (`{app_data_dir}/cloudpos/ledger.db`).
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self::at_path(default_db_path()?))
    }

    /// Create a store backed by an explicit database file.
    pub fn at_path(db_path: PathBuf) -> Self {
        Self {
            pool: Arc::new(Mutex::new(None)),
            db_path,
        }
    }

    pub fn db_path(&self) -> &PathBuf {
        &self.db_path
    }

    /// Initialize the database connection (called lazily on first use).
    async fn ensure_initialized(&self) -> anyhow::Result<()> {
        let mut pool_guard = self.pool.lock().await;
        if pool_guard.is_some() {
            return Ok(());
        }

        if let Some(parent) = self.db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create storage directory at {parent:?}"))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&self.db_path)
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options)
            .await
            .with_context(|| format!("failed to open ledger database at {:?}", self.db_path))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                storage_key TEXT NOT NULL PRIMARY KEY,
                data        TEXT NOT NULL,
                saved_at    TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .context("failed to create documents table")?;

        *pool_guard = Some(pool);
        Ok(())
    }

    /// Get the pool, initializing if necessary.
    async fn get_pool(&self) -> anyhow::Result<SqlitePool> {
        self.ensure_initialized().await?;
        let pool_guard = self.pool.lock().await;
        pool_guard
            .clone()
            .context("ledger database pool missing after initialization")
    }

    async fn load_async(&self) -> anyhow::Result<Ledger> {
        let pool = self.get_pool().await?;

        let row = sqlx::query(
            r#"
            SELECT data
            FROM documents
            WHERE storage_key = ?1
            "#,
        )
        .bind(LEDGER_STORAGE_KEY)
        .fetch_optional(&pool)
        .await
        .context("failed to fetch persisted ledger")?;

        let row = match row {
            Some(row) => row,
            None => return Ok(Ledger::new()),
        };

        let data: String = row.try_get("data")?;
        Ok(decode_ledger(&data))
    }

    async fn save_async(&self, ledger: &Ledger) -> anyhow::Result<()> {
        let pool = self.get_pool().await?;
        let payload = encode_ledger(ledger)?;
        let saved_at = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO documents (storage_key, data, saved_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(storage_key)
            DO UPDATE SET
                data = excluded.data,
                saved_at = excluded.saved_at
            "#,
        )
        .bind(LEDGER_STORAGE_KEY)
        .bind(&payload)
        .bind(&saved_at)
        .execute(&pool)
        .await
        .context("failed to upsert persisted ledger")?;

        Ok(())
    }
}

impl LedgerStore for SqliteLedgerStore {
    fn load(&self) -> anyhow::Result<Ledger> {
        let rt = Runtime::new().context("failed to create runtime for ledger load")?;
        rt.block_on(self.load_async())
    }

    fn save(&self, ledger: &Ledger) -> anyhow::Result<()> {
        let rt = Runtime::new().context("failed to create runtime for ledger save")?;
        rt.block_on(self.save_async(ledger))
    }
}

/// Resolve the default ledger database path:
/// `{app_data_dir}/cloudpos/ledger.db`.
fn default_db_path() -> anyhow::Result<PathBuf> {
    let base = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut home| {
                home.push(".local");
                home.push("share");
                home
            })
        })
        .context("failed to resolve OS app data directory - tried data_dir() and home_dir()/.local/share")?;

    let mut dir = base;
    dir.push("cloudpos");
    dir.push("ledger.db");
    Ok(dir)
}
