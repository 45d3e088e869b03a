//! 启动阶段错误
//!
//! 这些错误都是致命的：记录日志后进程以失败状态退出

use std::net::SocketAddr;

use mesh_adapter_postgres::ConnectionError;
use mesh_config::ConfigError;
use mesh_errors::AppError;
use mesh_telemetry::TelemetryError;
use thiserror::Error;

use crate::lifecycle::BootstrapState;

/// 下游客户端构造失败
#[derive(Debug, Error)]
pub enum DialError {
    #[error("Invalid address for downstream `{service}`: {reason}")]
    InvalidAddress { service: String, reason: String },

    #[error("TLS setup failed for downstream `{service}`: {reason}")]
    Tls { service: String, reason: String },

    #[error("Identity metadata `{key}` has a non-ASCII value {value:?}")]
    InvalidMetadata { key: &'static str, value: String },
}

/// 监听地址绑定失败
#[derive(Debug, Error)]
pub enum BindError {
    #[error("Port {port} is below the allowed minimum {min_port}")]
    PortNotAllowed { port: u16, min_port: u16 },

    #[error("Address {0} is already in use")]
    AddressInUse(SocketAddr),

    #[error("Invalid listen address `{addr}`: {reason}")]
    Invalid { addr: String, reason: String },

    #[error("Failed to bind {addr}: {source}")]
    Io {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("gRPC server failed: {0}")]
    Transport(#[from] tonic::transport::Error),
}

#[derive(Debug, Error)]
#[error("Illegal lifecycle transition {from:?} -> {to:?}")]
pub struct LifecycleError {
    pub from: BootstrapState,
    pub to: BootstrapState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Dial(#[from] DialError),

    #[error("Failed to compose services: {0}")]
    Compose(#[source] AppError),

    #[error(transparent)]
    Bind(#[from] BindError),

    #[error(transparent)]
    Serve(#[from] ServeError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

impl BootstrapError {
    /// 失败所在阶段（日志字段）
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Telemetry(_) => "telemetry",
            Self::Connection(_) | Self::Dial(_) => "provision",
            Self::Compose(_) => "compose",
            Self::Bind(_) => "bind",
            Self::Serve(_) => "serve",
            Self::Lifecycle(_) => "lifecycle",
        }
    }
}
