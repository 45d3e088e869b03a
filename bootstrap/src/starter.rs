//! 服务启动器
//!
//! 启动顺序：
//! 1. 初始化随机源
//! 2. 加载配置
//! 3. 初始化日志上下文
//! 4. 打开数据库、创建下游通道
//! 5. 调用用户提供的闭包组装 gRPC 服务
//! 6. 绑定并启动服务器，直到收到关闭信号
//!
//! 任一阶段失败都直接进入 `Stopped`，已打开的数据库会被关闭。
//!
//! # 示例
//!
//! ```ignore
//! use mesh_bootstrap::{Bootstrap, GrpcServer, shutdown_signal};
//!
//! #[tokio::main]
//! async fn main() -> ExitCode {
//!     let result = Bootstrap::new("config.yml")
//!         .run(|infra| {
//!             let service = MyServiceImpl::new(infra.pool());
//!             Ok(GrpcServer::new(&infra.config().grpc).add_service(MyServiceServer::new(service)))
//!         }, shutdown_signal())
//!         .await;
//!     ...
//! }
//! ```

use std::future::Future;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mesh_adapter_postgres::Migrator;
use mesh_config::AppConfig;
use mesh_errors::AppError;
use mesh_telemetry::{TelemetryGuard, init_fallback};
use tokio::sync::watch;
use tracing::{error, info};

use crate::error::BootstrapError;
use crate::health::{StatusState, VersionInfo, spawn_status_server};
use crate::infrastructure::Infrastructure;
use crate::lifecycle::{BootstrapState, Lifecycle};
use crate::metrics::install_recorder;
use crate::runtime::{init_telemetry, log_banner, seed_rng};
use crate::server::GrpcServer;

/// 进程启动流程
pub struct Bootstrap<'m> {
    config_path: PathBuf,
    downstream: Vec<String>,
    migrator: Option<&'m Migrator>,
    lifecycle: Lifecycle,
    local_addr: watch::Sender<Option<SocketAddr>>,
}

impl<'m> Bootstrap<'m> {
    pub fn new(config_path: impl AsRef<Path>) -> Self {
        let (local_addr, _) = watch::channel(None);
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            downstream: Vec::new(),
            migrator: None,
            lifecycle: Lifecycle::new(),
            local_addr,
        }
    }

    /// 声明需要的下游服务（配置中必须存在）
    pub fn with_downstream(mut self, name: impl Into<String>) -> Self {
        self.downstream.push(name.into());
        self
    }

    /// 配置 `run_migrations` 时执行的迁移
    pub fn with_migrator(mut self, migrator: &'m Migrator) -> Self {
        self.migrator = Some(migrator);
        self
    }

    /// 订阅状态变化
    pub fn subscribe(&self) -> watch::Receiver<BootstrapState> {
        self.lifecycle.subscribe()
    }

    /// 订阅实际监听地址（绑定后可用）
    pub fn local_addr(&self) -> watch::Receiver<Option<SocketAddr>> {
        self.local_addr.subscribe()
    }

    pub fn state(&self) -> BootstrapState {
        self.lifecycle.state()
    }

    pub fn history(&self) -> &[BootstrapState] {
        self.lifecycle.history()
    }

    /// 执行完整启动流程，阻塞到 `shutdown` 完成
    pub async fn run<B, F>(&mut self, builder: B, shutdown: F) -> Result<(), BootstrapError>
    where
        B: FnOnce(&Infrastructure) -> Result<GrpcServer, AppError>,
        F: Future<Output = ()>,
    {
        // 日志上下文的 guard 必须活到失败日志写出之后
        let mut telemetry: Option<TelemetryGuard> = None;
        let result = self.run_stages(builder, shutdown, &mut telemetry).await;
        if let Err(e) = &result {
            error!(stage = e.stage(), error = %e, "Bootstrap failed");
            self.lifecycle.fail();
        }
        drop(telemetry);
        result
    }

    async fn run_stages<B, F>(
        &mut self,
        builder: B,
        shutdown: F,
        telemetry: &mut Option<TelemetryGuard>,
    ) -> Result<(), BootstrapError>
    where
        B: FnOnce(&Infrastructure) -> Result<GrpcServer, AppError>,
        F: Future<Output = ()>,
    {
        let rng = seed_rng();

        let config = match self.load_config() {
            Ok(config) => Arc::new(config),
            Err(e) => {
                init_fallback();
                return Err(e);
            }
        };

        *telemetry = init_telemetry(&config, rng).inspect_err(|_| init_fallback())?;
        install_recorder();
        log_banner(&config);
        self.lifecycle.advance(BootstrapState::ConfiguredLogging)?;

        let infra = Infrastructure::provision(config.clone(), &self.downstream, self.migrator).await?;

        // 数据库打开之后的任何退出路径都在这里关闭它，且只关闭一次
        let result = self.compose_and_serve(&config, &infra, builder, shutdown).await;
        infra.close().await;
        result?;

        self.lifecycle.advance(BootstrapState::Stopped)?;
        info!("Service stopped");
        Ok(())
    }

    fn load_config(&self) -> Result<AppConfig, BootstrapError> {
        let config = AppConfig::load(&self.config_path)?;
        for name in &self.downstream {
            config.downstream(name)?;
        }
        Ok(config)
    }

    async fn compose_and_serve<B, F>(
        &mut self,
        config: &AppConfig,
        infra: &Infrastructure,
        builder: B,
        shutdown: F,
    ) -> Result<(), BootstrapError>
    where
        B: FnOnce(&Infrastructure) -> Result<GrpcServer, AppError>,
        F: Future<Output = ()>,
    {
        self.lifecycle.advance(BootstrapState::ConnectionsProvisioned)?;

        let server = builder(infra).map_err(BootstrapError::Compose)?;
        info!(services = ?server.services(), "Services composed");
        self.lifecycle.advance(BootstrapState::ServicesComposed)?;

        let bound = server.bind().await?;
        self.local_addr.send_replace(Some(bound.local_addr()));

        let status_handle = match &config.status {
            Some(status) => {
                let state = StatusState::new(
                    self.lifecycle.subscribe(),
                    Some(infra.database().clone()),
                    VersionInfo::from_project(&config.project),
                );
                spawn_status_server(status, state).await
            }
            None => None,
        };

        self.lifecycle.advance(BootstrapState::Serving)?;
        let served = bound.serve(shutdown).await;

        self.lifecycle.advance(BootstrapState::ShuttingDown)?;
        if let Some(handle) = status_handle {
            handle.abort();
        }
        served?;
        Ok(())
    }
}
