//! mesh-telemetry - 可观测性库
//!
//! 日志上下文在启动阶段显式构造：本地 stderr 输出，
//! 以及可选的 Graylog（GELF/UDP）远程输出，两者共用同一个最低级别。

mod gelf;

use std::io::Write;
use std::sync::Arc;

use rand::rngs::StdRng;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub use gelf::{GelfLayer, GelfSink, chunk_payload, syslog_level};

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Invalid log level `{level}`: {reason}")]
    InvalidLevel { level: String, reason: String },

    #[error("Failed to set up GELF sink at {addr}: {reason}")]
    Sink { addr: String, reason: String },

    #[error("A global subscriber is already installed")]
    AlreadyInstalled,
}

/// 日志输出设置
#[derive(Debug, Clone)]
pub struct TelemetrySettings {
    /// 最低级别（EnvFilter 指令）
    pub level: String,
    /// 本地输出使用 JSON 格式
    pub json: bool,
    /// 附加到远程消息上的服务名
    pub service: String,
    /// Graylog GELF UDP 地址
    pub graylog_addr: Option<String>,
}

/// 显式构造的日志上下文
pub struct Telemetry {
    filter: EnvFilter,
    json: bool,
    gelf: Option<Arc<GelfSink>>,
}

impl Telemetry {
    /// 根据设置构造日志上下文，尚未安装
    ///
    /// `RUST_LOG` 存在时覆盖配置的级别
    pub fn new(settings: &TelemetrySettings, rng: StdRng) -> Result<Self, TelemetryError> {
        let filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(&settings.level).map_err(|e| {
                TelemetryError::InvalidLevel {
                    level: settings.level.clone(),
                    reason: e.to_string(),
                }
            })?,
        };

        let gelf = match &settings.graylog_addr {
            Some(addr) => Some(Arc::new(GelfSink::connect(addr, &settings.service, rng)?)),
            None => None,
        };

        Ok(Self {
            filter,
            json: settings.json,
            gelf,
        })
    }

    /// 是否启用了远程输出
    pub fn has_remote_sink(&self) -> bool {
        self.gelf.is_some()
    }

    /// 安装为进程级 subscriber
    ///
    /// 返回的 guard 被 drop 时刷新本地输出
    pub fn install(self) -> Result<TelemetryGuard, TelemetryError> {
        let gelf_layer = self.gelf.clone().map(GelfLayer::new);
        let registry = tracing_subscriber::registry()
            .with(self.filter)
            .with(gelf_layer);

        let result = if self.json {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .try_init()
        } else {
            registry
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .try_init()
        };
        result.map_err(|_| TelemetryError::AlreadyInstalled)?;

        Ok(TelemetryGuard { gelf: self.gelf })
    }
}

/// 日志上下文的生命周期句柄
#[must_use = "dropping the guard flushes and detaches the log sinks"]
pub struct TelemetryGuard {
    gelf: Option<Arc<GelfSink>>,
}

impl TelemetryGuard {
    /// 远程输出丢弃的消息数
    pub fn dropped_remote_messages(&self) -> u64 {
        self.gelf.as_ref().map(|sink| sink.dropped()).unwrap_or(0)
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        let dropped = self.dropped_remote_messages();
        if dropped > 0 {
            tracing::warn!(dropped, "GELF sink dropped messages");
        }
        if let Some(sink) = &self.gelf {
            sink.close();
        }
        let _ = std::io::stderr().flush();
    }
}

/// 初始化 tracing
pub fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// 配置尚未可用时的兜底输出，保证启动失败也能留下日志
pub fn init_fallback() {
    init_tracing("info");
}
