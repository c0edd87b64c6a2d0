use recordgate_common::config::{LogConfig, RecordgateConfig};
use std::fs;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use crate::error::Result;

const LOG_FILE_NAME: &str = "recordgate.log";

/// Guard for the non-blocking log writer, flushes on drop
#[derive(Default)]
pub struct ObservabilityGuard {
    log_guard: Option<WorkerGuard>,
}

impl ObservabilityGuard {
    pub fn writes_to_file(&self) -> bool {
        self.log_guard.is_some()
    }
}

/// Initialize logging based on configuration
pub fn init_observability(config: &RecordgateConfig) -> Result<ObservabilityGuard> {
    let mut guard = ObservabilityGuard::default();
    let observability_config = config.observability_config();

    match observability_config.log.output.as_str() {
        "file" => {
            fs::create_dir_all(&observability_config.log.path)?;
            let (non_blocking, worker_guard) = build_file_writer(&observability_config.log)?;
            guard.log_guard = Some(worker_guard);

            init_subscriber_with_writer(non_blocking, false, config);
        }
        _ => {
            init_subscriber_with_writer(std::io::stdout, true, config);
        }
    }

    Ok(guard)
}

/// Create an EnvFilter from config, with RUST_LOG taking precedence
fn create_env_filter(config: &RecordgateConfig) -> EnvFilter {
    let directive = config.get_filter_level();
    println!("Using log filter directive: {directive}");

    EnvFilter::try_new(&directive).unwrap_or_else(|_| {
        println!("Failed to parse filter directive: {directive}. Falling back to default: info");
        EnvFilter::new("info")
    })
}

fn init_subscriber_with_writer<W>(writer: W, use_ansi: bool, config: &RecordgateConfig)
where
    W: for<'a> fmt::MakeWriter<'a> + Send + Sync + 'static,
{
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(use_ansi)
        .with_writer(writer);

    // 重复初始化（如测试中）时忽略错误
    tracing_subscriber::registry()
        .with(create_env_filter(config))
        .with(fmt_layer)
        .try_init()
        .ok();
}

fn build_file_writer(log_config: &LogConfig) -> Result<(NonBlocking, WorkerGuard)> {
    println!("日志写入模式: 文件");
    println!("  - 路径: {}", log_config.path);
    println!(
        "  - 轮转: {}",
        if log_config.rotate {
            "开启（按天）"
        } else {
            "关闭"
        }
    );

    if log_config.rotate {
        let file_appender = tracing_appender::rolling::daily(&log_config.path, LOG_FILE_NAME);
        Ok(tracing_appender::non_blocking(file_appender))
    } else {
        let log_file_path = std::path::Path::new(&log_config.path).join(LOG_FILE_NAME);
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file_path)?;
        Ok(tracing_appender::non_blocking(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_writer_creates_log_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_config = LogConfig {
            output: "file".to_string(),
            rotate: false,
            path: temp_dir.path().display().to_string(),
        };

        let (_writer, _guard) = build_file_writer(&log_config).unwrap();
        assert!(temp_dir.path().join(LOG_FILE_NAME).exists());
    }

    #[test]
    fn test_invalid_filter_falls_back() {
        let mut config = RecordgateConfig::default();
        config.observability.filter_level = "info,[[[".to_string();
        // RUST_LOG 未设置时使用配置值，非法语法回退到 info
        if std::env::var("RUST_LOG").is_err() {
            let filter = create_env_filter(&config);
            assert_eq!(filter.to_string(), "info");
        }
    }
}
