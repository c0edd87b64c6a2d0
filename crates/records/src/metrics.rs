//! Prometheus 监控指标
//!
//! 指标注册到本 crate 的 `REGISTRY`，由网关在启用时通过 HTTP 导出。

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Once;

static METRICS_INIT: Once = Once::new();

lazy_static! {
    /// 网关指标 Registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// 成功追加的记录数
    pub static ref RECORDS_APPENDED: IntCounter = IntCounter::with_opts(
        Opts::new("records_appended_total", "Total number of records appended")
            .namespace("recordgate")
    ).unwrap();

    /// 列举时被跳过的条目（按原因分组）
    pub static ref ENTRIES_SKIPPED: IntCounterVec = IntCounterVec::new(
        Opts::new("entries_skipped_total", "Stored entries dropped from list results")
            .namespace("recordgate"),
        &["reason"]
    ).unwrap();

    /// 因分页失败而提前结束的列举次数
    pub static ref LIST_TRUNCATED: IntCounter = IntCounter::with_opts(
        Opts::new("list_truncated_total", "List requests cut short by a failing page call")
            .namespace("recordgate")
    ).unwrap();

    /// HTTP 请求总数
    pub static ref REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("requests_total", "Total number of HTTP requests")
            .namespace("recordgate"),
        &["method", "status"]
    ).unwrap();
}

/// 注册所有网关指标（重复调用只生效一次）
pub fn register_metrics() -> Result<(), prometheus::Error> {
    let mut result = Ok(());
    METRICS_INIT.call_once(|| {
        result = (|| -> Result<(), prometheus::Error> {
            REGISTRY.register(Box::new(RECORDS_APPENDED.clone()))?;
            REGISTRY.register(Box::new(ENTRIES_SKIPPED.clone()))?;
            REGISTRY.register(Box::new(LIST_TRUNCATED.clone()))?;
            REGISTRY.register(Box::new(REQUESTS_TOTAL.clone()))?;
            Ok(())
        })();
    });
    result
}

/// 以 Prometheus 文本格式导出
pub fn export_metrics() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        tracing::warn!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
