//! 记录存储模块
//!
//! 提供多种存储后端支持：Memory, SQLite, Redis
//!
//! # 设计
//!
//! - `KvStore` trait 定义统一的异步接口（list / get / put）
//! - 网关持有 `Arc<dyn KvStore>`，测试可注入内存实现或故障实现
//! - 通过 `StorageConfig` 配置选择和初始化后端

use std::path::Path;
use std::sync::Arc;

pub mod backend;
pub mod config;
pub mod memory;

#[cfg(feature = "backend-sqlite")]
pub mod sqlite;

#[cfg(feature = "backend-redis")]
pub mod redis;

use crate::error::{RecordError, RecordResult};

pub use backend::{KvStore, ListPage};
pub use config::{RedisConfig, StorageBackend, StorageConfig};
pub use memory::MemoryBackend;

#[cfg(feature = "backend-sqlite")]
pub use self::sqlite::SqliteBackend;

#[cfg(feature = "backend-redis")]
pub use self::redis::RedisBackend;

/// 从配置创建存储实例
///
/// # Arguments
/// * `config` - 存储配置
/// * `data_dir` - 数据目录（当 backend = "sqlite" 时使用）
///
/// # Errors
/// - 缺少对应后端的配置
/// - 后端初始化失败
/// - 后端功能未启用（feature flag）
pub async fn open_store<P: AsRef<Path>>(
    config: &StorageConfig,
    data_dir: P,
) -> RecordResult<Arc<dyn KvStore>> {
    match config.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryBackend::new())),

        #[cfg(feature = "backend-sqlite")]
        StorageBackend::Sqlite => {
            let backend = SqliteBackend::new(data_dir.as_ref()).await?;
            Ok(Arc::new(backend))
        }

        #[cfg(feature = "backend-redis")]
        StorageBackend::Redis => {
            let cfg = config
                .redis
                .as_ref()
                .ok_or_else(|| RecordError::Config("Missing Redis config".into()))?;
            let backend = RedisBackend::new(cfg).await?;
            Ok(Arc::new(backend))
        }

        #[cfg(not(feature = "backend-sqlite"))]
        StorageBackend::Sqlite => {
            let _ = data_dir;
            Err(RecordError::Config(
                "SQLite backend not enabled. Compile with --features backend-sqlite".into(),
            ))
        }

        #[cfg(not(feature = "backend-redis"))]
        StorageBackend::Redis => Err(RecordError::Config(
            "Redis backend not enabled. Compile with --features backend-redis".into(),
        )),
    }
}
