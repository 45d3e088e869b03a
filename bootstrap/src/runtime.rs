//! 服务运行时

use mesh_config::AppConfig;
use mesh_telemetry::{Telemetry, TelemetryError, TelemetryGuard, TelemetrySettings};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{error, info, warn};

/// 显式的随机源初始化，启动最早阶段调用一次
pub fn seed_rng() -> StdRng {
    StdRng::from_entropy()
}

/// 由配置得到日志设置
pub fn telemetry_settings(config: &AppConfig) -> TelemetrySettings {
    TelemetrySettings {
        level: config.log_level().to_string(),
        json: config.is_production(),
        service: config.project.service_name.clone(),
        graylog_addr: config.telemetry.graylog_addr.clone(),
    }
}

/// 初始化日志上下文
///
/// 已有全局 subscriber 时沿用它并返回 `None`
pub fn init_telemetry(
    config: &AppConfig,
    rng: StdRng,
) -> Result<Option<TelemetryGuard>, TelemetryError> {
    let telemetry = Telemetry::new(&telemetry_settings(config), rng)?;
    match telemetry.install() {
        Ok(guard) => Ok(Some(guard)),
        Err(TelemetryError::AlreadyInstalled) => {
            warn!("Global subscriber already installed, keeping it");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// 启动横幅
pub fn log_banner(config: &AppConfig) {
    info!(
        service = %config.project.service_name,
        version = %config.project.version,
        commit_hash = %config.project.commit_hash,
        debug = config.project.debug,
        environment = %config.project.environment,
        "Starting {}",
        config.project.name
    );
}

/// 等待关闭信号
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
