//! SQLite 存储后端实现
//!
//! 使用 sqlx 提供原生异步 SQLite 存储支持

use crate::error::{StoreError, StoreResult};
use crate::storage::backend::{KvStore, ListPage};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// 数据库文件名，位于 data_dir 下
pub const DB_FILE_NAME: &str = "records.db";

/// SQLite 存储后端
#[derive(Clone)]
pub struct SqliteBackend {
    pool: SqlitePool,
}

impl std::fmt::Debug for SqliteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBackend")
            .field("pool_size", &self.pool.size())
            .finish()
    }
}

impl SqliteBackend {
    /// 创建新的 SQLite 后端实例
    ///
    /// # Arguments
    /// * `data_dir` - 数据库文件存储目录路径，文件为 `{data_dir}/records.db`
    pub async fn new(data_dir: &Path) -> StoreResult<Self> {
        let file = data_dir.join(DB_FILE_NAME);

        // 创建连接选项并启用 WAL 模式
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", file.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Connection(format!("Failed to connect to SQLite: {e}")))?;

        let backend = Self { pool };
        backend.init().await?;

        info!(
            "SQLite record storage initialized: path={}, WAL mode enabled",
            file.display()
        );

        Ok(backend)
    }

    async fn init(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        debug!("SQLite records table initialized");
        Ok(())
    }
}

#[async_trait]
impl KvStore for SqliteBackend {
    async fn list(&self, cursor: Option<&str>, limit: usize) -> StoreResult<ListPage> {
        let limit = limit.max(1);
        // 多取一行用于判断是否还有下一页
        let fetch = (limit + 1) as i64;

        let rows: Vec<(String,)> = match cursor {
            Some(after) => {
                sqlx::query_as("SELECT key FROM records WHERE key > ?1 ORDER BY key LIMIT ?2")
                    .bind(after)
                    .bind(fetch)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_as("SELECT key FROM records ORDER BY key LIMIT ?1")
                    .bind(fetch)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        let has_more = rows.len() > limit;
        let keys: Vec<String> = rows.into_iter().take(limit).map(|(k,)| k).collect();
        let cursor = if has_more { keys.last().cloned() } else { None };

        debug!("Listed {} keys (more: {})", keys.len(), has_more);
        Ok(ListPage { keys, cursor })
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM records WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(value,)| value))
    }

    async fn put(&self, key: &str, value: &str) -> StoreResult<()> {
        let now = chrono::Utc::now().timestamp_millis();

        sqlx::query(
            r#"INSERT INTO records (key, value, created_at) VALUES (?1, ?2, ?3)
               ON CONFLICT(key) DO UPDATE SET value = excluded.value"#,
        )
        .bind(key)
        .bind(value)
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!("Stored record under key: {}", key);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "SQLite"
    }
}
