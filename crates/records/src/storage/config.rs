//! 存储后端配置
//!
//! 定义各种存储后端的配置结构

use serde::{Deserialize, Serialize};

/// 存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// 存储后端类型
    pub backend: StorageBackend,

    /// 每次 list 调用最多返回的 key 数量
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Redis 配置（当 backend = "redis" 时必需）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redis: Option<RedisConfig>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            page_size: default_page_size(),
            redis: None,
        }
    }
}

fn default_page_size() -> usize {
    1000
}

/// 存储后端类型枚举
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// 进程内存（重启即丢失）
    Memory,
    /// SQLite 数据库
    Sqlite,
    /// Redis 内存数据库
    Redis,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Memory => "memory",
            StorageBackend::Sqlite => "sqlite",
            StorageBackend::Redis => "redis",
        }
    }
}

/// Redis 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Redis 连接 URL
    ///
    /// 格式：redis://[username:password@]host[:port][/database]
    /// 示例：redis://localhost:6379/0
    pub url: String,

    /// 记录 key 的前缀，SCAN 时只匹配此前缀
    #[serde(default = "default_redis_prefix")]
    pub prefix: String,

    /// 连接池大小
    #[serde(default = "default_redis_pool_size")]
    pub pool_size: usize,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379/0".to_string(),
            prefix: default_redis_prefix(),
            pool_size: default_redis_pool_size(),
        }
    }
}

fn default_redis_prefix() -> String {
    "records:".to_string()
}

fn default_redis_pool_size() -> usize {
    16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_storage_config() {
        let config = StorageConfig::default();
        assert_eq!(config.backend, StorageBackend::Sqlite);
        assert_eq!(config.page_size, 1000);
        assert!(config.redis.is_none());
    }

    #[test]
    fn test_serialize_sqlite_config() {
        let config = StorageConfig {
            backend: StorageBackend::Sqlite,
            page_size: 50,
            redis: None,
        };

        let toml = toml::to_string(&config).unwrap();
        assert!(toml.contains("backend = \"sqlite\""));
        assert!(toml.contains("page_size = 50"));
        assert!(!toml.contains("redis"));
    }

    #[test]
    fn test_deserialize_redis_config() {
        let toml_str = r#"
            backend = "redis"

            [redis]
            url = "redis://localhost:6379/1"
        "#;

        let config: StorageConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.backend, StorageBackend::Redis);
        assert_eq!(config.page_size, 1000);

        let redis = config.redis.unwrap();
        assert_eq!(redis.url, "redis://localhost:6379/1");
        assert_eq!(redis.prefix, "records:");
        assert_eq!(redis.pool_size, 16);
    }
}
