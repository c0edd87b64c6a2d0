//! Record Gateway 配置
//!
//! 两种历史变体（手机备份 / 号码查询）只在路由与文案上不同，
//! 统一为一个 `variant` 预设，再允许单独覆盖 route 与 title。

use crate::storage::StorageConfig;
use serde::{Deserialize, Serialize};

/// 网关变体预设
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// 手机备份记录，挂载在 `/`
    #[default]
    PhoneBackup,
    /// 号码查询记录，挂载在 `/api/queries`
    PhoneQuery,
}

impl Variant {
    pub fn default_route(&self) -> &'static str {
        match self {
            Variant::PhoneBackup => "/",
            Variant::PhoneQuery => "/api/queries",
        }
    }

    pub fn default_title(&self) -> &'static str {
        match self {
            Variant::PhoneBackup => "Phone Backup Worker",
            Variant::PhoneQuery => "Phone Query Worker",
        }
    }

    /// 欢迎信息中描述单条记录所用的名词
    pub fn noun(&self) -> &'static str {
        match self {
            Variant::PhoneBackup => "record",
            Variant::PhoneQuery => "query record",
        }
    }
}

/// key 生成策略
///
/// 不提供"总数 + 1"策略：并发写入时两个请求会读到相同的总数而互相覆盖。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum KeyPolicy {
    /// 毫秒时间戳，进程内严格递增
    #[default]
    Timestamp,
    /// 随机 UUID v4，多实例共享同一存储时使用
    Uuid,
}

/// Prometheus 指标导出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enable: bool,

    #[serde(default = "default_metrics_path")]
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enable: false,
            path: default_metrics_path(),
        }
    }
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

/// POST 请求体上限，与 axum 默认值一致
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

/// Record Gateway 服务配置
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayServiceConfig {
    /// 变体预设
    #[serde(default)]
    pub variant: Variant,

    /// 记录路由，未配置时使用变体默认值
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,

    /// 欢迎信息标题，未配置时使用变体默认值
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// key 生成策略
    #[serde(default)]
    pub key_policy: KeyPolicy,

    /// POST 请求体字节上限，超出返回 413
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// 存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 指标导出配置
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Default for GatewayServiceConfig {
    fn default() -> Self {
        Self {
            variant: Variant::default(),
            route: None,
            title: None,
            key_policy: KeyPolicy::default(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            storage: StorageConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl GatewayServiceConfig {
    pub fn for_variant(variant: Variant) -> Self {
        Self {
            variant,
            ..Default::default()
        }
    }

    /// 生效的记录路由
    pub fn route(&self) -> &str {
        self.route
            .as_deref()
            .unwrap_or_else(|| self.variant.default_route())
    }

    /// 生效的欢迎标题
    pub fn title(&self) -> &str {
        self.title
            .as_deref()
            .unwrap_or_else(|| self.variant.default_title())
    }

    /// 校验网关配置，返回所有发现的问题
    ///
    /// 以 "Warning:" 开头的条目不阻止启动
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        let route = self.route();
        if !route.starts_with('/') {
            problems.push(format!("gateway.route must start with '/': {route:?}"));
        }

        if self.max_body_bytes == 0 {
            problems.push("gateway.max_body_bytes must be greater than 0".to_string());
        }

        if self.storage.page_size == 0 {
            problems.push("gateway.storage.page_size must be greater than 0".to_string());
        }

        if self.storage.backend == crate::storage::StorageBackend::Redis {
            if self.storage.redis.is_none() {
                problems.push(
                    "gateway.storage.backend = \"redis\" requires [gateway.storage.redis]"
                        .to_string(),
                );
            }
            if self.key_policy == KeyPolicy::Timestamp {
                problems.push(
                    "Warning: timestamp keys are only unique per process; use key_policy = \"uuid\" if several gateways share one redis"
                        .to_string(),
                );
            }
        }

        if self.metrics.enable {
            if !self.metrics.path.starts_with('/') {
                problems.push(format!(
                    "gateway.metrics.path must start with '/': {:?}",
                    self.metrics.path
                ));
            }
            if self.metrics.path == route {
                problems.push(format!(
                    "gateway.metrics.path conflicts with record route {route:?}"
                ));
            }
        }

        problems
    }
}
