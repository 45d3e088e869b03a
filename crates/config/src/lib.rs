//! mesh-config - 配置加载库
//!
//! 启动时读取一次 YAML 配置文件，叠加 `MESH_` 前缀的环境变量，
//! 校验后得到进程级只读的配置快照。

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use secrecy::Secret;
use serde::Deserialize;
use thiserror::Error;

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config.yml";

/// 环境变量前缀，`__` 作为层级分隔符（`MESH_GRPC__PORT`）
pub const ENV_PREFIX: &str = "MESH_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to load config: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("Downstream service `{0}` is not configured")]
    MissingDownstream(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Load(Box::new(err))
    }
}

/// 项目信息
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    pub service_name: String,
    pub version: String,
    #[serde(default = "default_commit_hash")]
    pub commit_hash: String,
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "default_environment")]
    pub environment: String,
}

fn default_commit_hash() -> String {
    "unknown".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

/// gRPC 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct GrpcConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_grpc_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_keepalive_interval_secs")]
    pub keepalive_interval_secs: u64,
    #[serde(default = "default_keepalive_timeout_secs")]
    pub keepalive_timeout_secs: u64,
    /// 允许绑定的最小端口，0 表示由系统分配，总是允许
    #[serde(default = "default_min_port")]
    pub min_port: u16,
}

fn default_grpc_timeout_secs() -> u64 {
    15
}

fn default_keepalive_interval_secs() -> u64 {
    60
}

fn default_keepalive_timeout_secs() -> u64 {
    20
}

fn default_min_port() -> u16 {
    1024
}

impl GrpcConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_secs(self.keepalive_interval_secs)
    }

    pub fn keepalive_timeout(&self) -> Duration {
        Duration::from_secs(self.keepalive_timeout_secs)
    }
}

/// 状态端点配置（/live、/ready、/version、/metrics）
#[derive(Debug, Clone, Deserialize)]
pub struct StatusConfig {
    pub host: String,
    pub port: u16,
}

/// 数据库配置
///
/// 直接给出 `dsn`，或者给出 host/port/user/password/name 组件
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub dsn: Option<Secret<String>>,
    pub host: Option<String>,
    #[serde(default = "default_database_port")]
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<Secret<String>>,
    pub name: Option<String>,
    pub ssl_mode: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// 初始化连接的截止时间
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default)]
    pub run_migrations: bool,
}

fn default_database_port() -> u16 {
    5432
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl DatabaseConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// 下游调用的传输安全设置，必须显式配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportSecurity {
    Insecure,
    Tls,
}

/// 下游服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct DownstreamConfig {
    pub addr: String,
    pub transport: TransportSecurity,
    pub ca_cert_path: Option<PathBuf>,
    pub tls_domain: Option<String>,
    #[serde(default = "default_downstream_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_downstream_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_downstream_connect_timeout_secs() -> u64 {
    5
}

fn default_downstream_request_timeout_secs() -> u64 {
    10
}

impl DownstreamConfig {
    /// 带协议前缀的地址；未写协议时按传输方式补全
    pub fn uri(&self) -> String {
        if self.addr.contains("://") {
            return self.addr.clone();
        }
        match self.transport {
            TransportSecurity::Insecure => format!("http://{}", self.addr),
            TransportSecurity::Tls => format!("https://{}", self.addr),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// 遥测配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: Option<String>,
    /// Graylog GELF UDP 地址（host:port）
    pub graylog_addr: Option<String>,
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub project: ProjectConfig,
    pub grpc: GrpcConfig,
    pub status: Option<StatusConfig>,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub downstream: BTreeMap<String, DownstreamConfig>,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let config: Self = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }

    /// 语义校验
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty("project.name", &self.project.name)?;
        require_non_empty("project.service_name", &self.project.service_name)?;
        require_non_empty("project.version", &self.project.version)?;
        require_non_empty("grpc.host", &self.grpc.host)?;

        require_positive("grpc.timeout_secs", self.grpc.timeout_secs)?;
        require_positive("grpc.keepalive_interval_secs", self.grpc.keepalive_interval_secs)?;
        require_positive("grpc.keepalive_timeout_secs", self.grpc.keepalive_timeout_secs)?;

        let db = &self.database;
        let has_components = db.host.is_some() && db.user.is_some() && db.name.is_some();
        if db.dsn.is_none() && !has_components {
            return Err(ConfigError::Invalid(
                "database requires either `dsn` or `host`, `user` and `name`".into(),
            ));
        }
        require_positive("database.connect_timeout_secs", db.connect_timeout_secs)?;
        if db.min_connections > db.max_connections {
            return Err(ConfigError::Invalid(
                "database.min_connections exceeds max_connections".into(),
            ));
        }

        for (name, downstream) in &self.downstream {
            self.validate_downstream(name, downstream)?;
        }

        if let Some(level) = &self.telemetry.log_level {
            require_non_empty("telemetry.log_level", level)?;
        }

        Ok(())
    }

    fn validate_downstream(&self, name: &str, cfg: &DownstreamConfig) -> Result<(), ConfigError> {
        require_non_empty(&format!("downstream.{name}.addr"), &cfg.addr)?;
        require_positive(
            &format!("downstream.{name}.connect_timeout_secs"),
            cfg.connect_timeout_secs,
        )?;
        require_positive(
            &format!("downstream.{name}.request_timeout_secs"),
            cfg.request_timeout_secs,
        )?;

        match cfg.transport {
            TransportSecurity::Tls if cfg.addr.starts_with("http://") => Err(ConfigError::Invalid(
                format!("downstream.{name}: transport `tls` with a plaintext http:// address"),
            )),
            TransportSecurity::Insecure if cfg.addr.starts_with("https://") => {
                Err(ConfigError::Invalid(format!(
                    "downstream.{name}: transport `insecure` with an https:// address"
                )))
            }
            TransportSecurity::Insecure if self.is_production() => {
                Err(ConfigError::Invalid(format!(
                    "downstream.{name}: transport `insecure` is not allowed in production"
                )))
            }
            _ => Ok(()),
        }
    }

    /// 获取指定下游服务配置
    pub fn downstream(&self, name: &str) -> Result<&DownstreamConfig, ConfigError> {
        self.downstream
            .get(name)
            .ok_or_else(|| ConfigError::MissingDownstream(name.to_string()))
    }

    /// 日志级别：显式配置优先，否则由 debug 开关决定
    pub fn log_level(&self) -> &str {
        match &self.telemetry.log_level {
            Some(level) => level,
            None if self.project.debug => "debug",
            None => "info",
        }
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.project.environment == "production"
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must not be empty")));
    }
    Ok(())
}

fn require_positive(field: &str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid(format!("{field} must be positive")));
    }
    Ok(())
}

#[cfg(test)]
mod tests;
