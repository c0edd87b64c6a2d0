//! Redis 存储后端实现
//!
//! 数据结构设计：
//! - {prefix}{key} -> String（序列化后的记录）
//!
//! 列举使用 `SCAN cursor MATCH {prefix}* COUNT n`，游标 "0" 表示扫描结束。
//! SCAN 可能重复返回同一个 key，也可能返回空页但游标未结束，调用方都要容忍。

use crate::error::{StoreError, StoreResult};
use crate::storage::backend::{KvStore, ListPage};
use crate::storage::config::RedisConfig;
use async_trait::async_trait;
use deadpool_redis::{Config, Pool, PoolConfig, Runtime};
use redis::AsyncCommands;
use tracing::{debug, info};

/// Redis 存储后端
#[derive(Clone)]
pub struct RedisBackend {
    pool: Pool,
    prefix: String,
}

impl std::fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBackend")
            .field("prefix", &self.prefix)
            .finish()
    }
}

impl RedisBackend {
    /// 创建新的 Redis 后端实例，并用 PING 验证连接
    pub async fn new(config: &RedisConfig) -> StoreResult<Self> {
        let mut cfg = Config::from_url(&config.url);
        cfg.pool = Some(PoolConfig::new(config.pool_size));
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| StoreError::Connection(format!("Failed to create Redis pool: {e}")))?;

        let backend = Self {
            pool,
            prefix: config.prefix.clone(),
        };

        let mut conn = backend.connection().await?;
        redis::cmd("PING")
            .query_async::<_, String>(&mut *conn)
            .await?;

        info!(
            "Redis record storage initialized: url={}, prefix={}",
            config.url, config.prefix
        );

        Ok(backend)
    }

    async fn connection(&self) -> StoreResult<deadpool_redis::Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::Connection(format!("Failed to get Redis connection: {e}")))
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

#[async_trait]
impl KvStore for RedisBackend {
    async fn list(&self, cursor: Option<&str>, limit: usize) -> StoreResult<ListPage> {
        let scan_cursor: u64 = match cursor {
            Some(c) => c
                .parse()
                .map_err(|_| StoreError::InvalidCursor(c.to_string()))?,
            None => 0,
        };

        let mut conn = self.connection().await?;
        let (next, raw_keys): (u64, Vec<String>) = redis::cmd("SCAN")
            .arg(scan_cursor)
            .arg("MATCH")
            .arg(format!("{}*", self.prefix))
            .arg("COUNT")
            .arg(limit.max(1))
            .query_async(&mut *conn)
            .await?;

        let keys = raw_keys
            .into_iter()
            .filter_map(|k| k.strip_prefix(&self.prefix).map(str::to_string))
            .collect::<Vec<_>>();

        debug!("SCAN {} -> {} keys, next cursor {}", scan_cursor, keys.len(), next);

        Ok(ListPage {
            keys,
            cursor: (next != 0).then(|| next.to_string()),
        })
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(self.full_key(key)).await?;
        Ok(value)
    }

    async fn put(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut conn = self.connection().await?;
        let _: () = conn.set(self.full_key(key), value).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "Redis"
    }
}
