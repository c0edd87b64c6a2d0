//! Record Gateway 数据类型定义

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 追加记录成功响应
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppendResponse {
    pub success: bool,
    /// 生成的记录 key
    pub key: String,
}

impl AppendResponse {
    pub fn stored(key: String) -> Self {
        Self { success: true, key }
    }
}

/// 欢迎信息中的端点说明
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Endpoints {
    pub get: String,
    pub post: String,
}

/// 未匹配请求返回的欢迎信息
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WelcomePayload {
    pub message: String,
    pub endpoints: Endpoints,
}

impl WelcomePayload {
    pub fn new(title: &str, route: &str, noun: &str) -> Self {
        Self {
            message: title.to_string(),
            endpoints: Endpoints {
                get: format!("GET {route} - Get all {noun}s"),
                post: format!("POST {route} - Save a {noun}"),
            },
        }
    }
}

/// 条目被跳过的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// 读取失败
    GetFailed(String),
    /// 存储的值不是合法 JSON
    InvalidJson(String),
}

impl SkipReason {
    /// 指标标签
    pub fn label(&self) -> &'static str {
        match self {
            SkipReason::GetFailed(_) => "get_failed",
            SkipReason::InvalidJson(_) => "invalid_json",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::GetFailed(e) => write!(f, "failed to get record: {e}"),
            SkipReason::InvalidJson(e) => write!(f, "failed to parse record: {e}"),
        }
    }
}

/// 单个 key 的加载结果
#[derive(Debug, Clone, PartialEq)]
pub enum EntryOutcome {
    /// 成功加载
    Loaded(Value),
    /// key 已列出但值不存在（列举与读取之间被移除）
    Missing,
    /// 跳过并记录诊断信息
    Skipped(SkipReason),
}

/// 一次完整列举的结果
#[derive(Debug, Clone, Default)]
pub struct ListReport {
    /// 成功加载的记录（未排序）
    pub records: Vec<Value>,
    /// 被跳过的条目 (key, 原因)
    pub skipped: Vec<(String, SkipReason)>,
    /// 值不存在的条目数
    pub missing: usize,
    /// 成功获取的页数
    pub pages: usize,
    /// 分页调用失败导致提前结束
    pub truncated: bool,
}
