//! Record Gateway - JSON 记录追加与查询服务
//!
//! 服务提供以下功能：
//! 1. POST 追加一条 JSON 记录，生成唯一 key 后写入键值存储
//! 2. GET 遍历整个存储，按 `timestamp` 倒序返回所有记录
//! 3. 所有响应携带 CORS 头，OPTIONS 直接应答
//! 4. 多存储后端支持：Memory, SQLite, Redis

pub mod config;
pub mod error;
pub mod handlers;
pub mod keys;
pub mod metrics;
pub mod ordering;
pub mod storage;
pub mod types;

// Re-export commonly used items
pub use config::{GatewayServiceConfig, KeyPolicy, MetricsConfig, Variant};
pub use error::{RecordError, RecordResult, StoreError, StoreResult};
pub use handlers::{GatewayState, collect_records, create_gateway_state, create_router};
pub use keys::KeyGenerator;
pub use storage::{KvStore, ListPage, StorageBackend, StorageConfig, open_store};
pub use types::{AppendResponse, EntryOutcome, ListReport, SkipReason, WelcomePayload};
