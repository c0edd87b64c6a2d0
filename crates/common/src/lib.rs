//! recordgate 基础设施库
//!
//! 提供统一的配置模型（TOML 加载、校验、默认值）

pub mod config;

pub use config::{BindConfig, LogConfig, ObservabilityConfig, RecordgateConfig};
