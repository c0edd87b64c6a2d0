//! recordgate 主程序
//!
//! 加载配置，打开记录存储，启动 HTTP 记录网关

mod cli;
mod error;
mod observability;
mod trace;

use anyhow::Context;
use clap::Parser;
use observability::init_observability;
use recordgate_common::config::RecordgateConfig;
use std::path::{Path, PathBuf};

use tracing::{error, info};

macro_rules! bootstrap_info {
    ($($arg:tt)*) => {
        println!($($arg)*);
    };
}

macro_rules! bootstrap_error {
    ($($arg:tt)*) => {
        eprintln!($($arg)*);
    };
}

use cli::{Cli, Commands};
use error::{Error, Result};

/// Application launcher utilities
struct ApplicationLauncher;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Test { config_file }) => {
            let config_path =
                ApplicationLauncher::find_config_file(config_file.as_ref().unwrap_or(&cli.config))?;
            ApplicationLauncher::test_config_file(&config_path)
        }
        None => {
            let config_path = ApplicationLauncher::find_config_file(&cli.config)?;

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;

            runtime.block_on(ApplicationLauncher::run_application(&config_path))
        }
    }
}

impl ApplicationLauncher {
    /// Find config file with fallback locations
    fn find_config_file(provided_path: &PathBuf) -> Result<PathBuf> {
        // 显式指定的路径必须存在，不做回退
        if provided_path != Path::new("config.toml") {
            if provided_path.exists() {
                bootstrap_info!("Using provided config file: {:?}", provided_path);
                return Ok(provided_path.clone());
            } else {
                bootstrap_error!("Provided config file not found: {:?}", provided_path);
                return Err(Error::custom(format!(
                    "Config file not found: {provided_path:?}"
                )));
            }
        }

        let fallback_paths = [
            PathBuf::from("config.toml"),
            PathBuf::from("/etc/recordgate/config.toml"),
        ];

        bootstrap_info!("Searching for config file in default locations...");

        for path in &fallback_paths {
            if path.exists() {
                bootstrap_info!("Found config file: {:?}", path);
                return Ok(path.clone());
            } else {
                bootstrap_info!("Config not found at: {:?}", path);
            }
        }

        bootstrap_error!("No configuration file found!");
        bootstrap_error!("Please create a config file in one of these locations:");
        for (i, path) in fallback_paths.iter().enumerate() {
            bootstrap_error!("  {}. {:?}", i + 1, path);
        }
        bootstrap_error!("Or specify a custom path with: recordgate --config <path>");

        Err(Error::custom(
            "No configuration file found. Please create one or specify path with --config",
        ))
    }

    /// 测试配置文件是否有效
    fn test_config_file(config_path: &Path) -> Result<()> {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .init();

        match RecordgateConfig::from_file(config_path) {
            Ok(config) => {
                info!("✅ 配置文件解析成功: {:?}", config_path);

                if let Err(errors) = config.validate() {
                    error!("❌ 配置验证发现问题:");
                    Self::report_validation(
                        &errors,
                        |line| info!("{line}"),
                        |line| error!("{line}"),
                    );
                    if errors.iter().any(|e| !e.starts_with("Warning:")) {
                        return Err(Error::service_validation("配置验证失败"));
                    }
                }

                info!(
                    "✅ 配置验证通过: variant={:?}, route={}, backend={}",
                    config.gateway.variant,
                    config.gateway.route(),
                    config.gateway.storage.backend.as_str()
                );
                Ok(())
            }
            Err(e) => {
                error!("❌ 配置文件解析失败: {}", e);
                Err(Error::service_validation(format!("配置解析失败: {e}")))
            }
        }
    }

    /// 逐条输出校验结果，告警和错误分开输出
    fn report_validation(
        errors: &[String],
        warn_out: impl Fn(String),
        error_out: impl Fn(String),
    ) {
        for (i, err) in errors.iter().enumerate() {
            if err.starts_with("Warning:") {
                warn_out(format!("  {}. ⚠️  {}", i + 1, err));
            } else {
                error_out(format!("  {}. ❌ {}", i + 1, err));
            }
        }
    }

    /// 运行应用程序的主入口
    async fn run_application(config_path: &Path) -> Result<()> {
        bootstrap_info!("📄 加载配置文件: {:?}", config_path);

        let config = match RecordgateConfig::from_file(config_path) {
            Ok(config) => {
                bootstrap_info!("✅ 配置加载成功");

                if let Err(errors) = config.validate() {
                    bootstrap_error!("❌ 配置验证发现问题:");
                    Self::report_validation(
                        &errors,
                        |line| {
                            bootstrap_info!("{line}");
                        },
                        |line| {
                            bootstrap_error!("{line}");
                        },
                    );
                    if errors.iter().any(|e| !e.starts_with("Warning:")) {
                        return Err(Error::custom("配置验证失败，请修复上述错误"));
                    }
                }

                config
            }
            Err(e) => {
                bootstrap_error!("❌ 配置加载失败: {}", e);
                return Err(Error::custom(format!("配置加载失败: {e}")));
            }
        };

        if !config.data_dir.exists() {
            std::fs::create_dir_all(&config.data_dir).with_context(|| {
                format!(
                    "Failed to create data directory: {}",
                    config.data_dir.display()
                )
            })?;
        }

        let observability_guard = init_observability(&config)?;
        if observability_guard.writes_to_file() {
            bootstrap_info!(
                "📝 日志输出到文件目录: {}",
                config.log_config().path
            );
        }

        let result = Self::serve(config).await;
        drop(observability_guard);
        result
    }

    /// 打开存储、绑定端口并运行到收到 Ctrl-C
    async fn serve(config: RecordgateConfig) -> Result<()> {
        info!("🚀 启动 {}", config.gateway.title());

        let state = records::create_gateway_state(&config.gateway, &config.data_dir).await?;
        info!(
            "✅ 记录存储就绪: backend={}, page_size={}",
            state.backend_name(),
            config.gateway.storage.page_size
        );

        let app = records::create_router(state).layer(trace::http_trace_layer());

        let addr = config
            .bind
            .socket_addr()
            .map_err(|e| Error::service_startup(format!("Invalid bind address: {e}")))?;
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind to address '{addr}'"))?;
        let local_addr = listener.local_addr()?;

        Self::display_service_info(&config, local_addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("🛑 服务已安全关闭");
        Ok(())
    }

    /// 显示服务信息
    fn display_service_info(config: &RecordgateConfig, local_addr: std::net::SocketAddr) {
        let base_url = format!("http://{local_addr}");
        let route = config.gateway.route();

        info!("📡 HTTP 服务器监听在: {}", base_url);
        info!("🔧 可用的API端点:");
        info!("  - GET  {}{}", base_url, route);
        info!("  - POST {}{}", base_url, route);
        if config.gateway.metrics.enable {
            info!("  - GET  {}{}", base_url, config.gateway.metrics.path);
        }
    }
}

/// 等待 Ctrl-C 信号
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("无法监听Ctrl-C信号: {}", e);
        std::future::pending::<()>().await;
    }
    info!("收到Ctrl-C信号，开始优雅关闭...");
}
