//! 状态端点
//!
//! 提供 /live、/ready、/version 和 /metrics；
//! 该服务器出错只记录日志，不影响 gRPC 服务

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use mesh_adapter_postgres::Database;
use mesh_config::{ProjectConfig, StatusConfig};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::lifecycle::BootstrapState;
use crate::metrics;

const DATABASE_PING_TIMEOUT: Duration = Duration::from_secs(2);

/// 健康检查状态
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub state: BootstrapState,
    pub checks: Vec<ComponentHealth>,
}

/// 组件健康状态
#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HealthStatus {
    fn new(state: BootstrapState) -> Self {
        let status = if state == BootstrapState::Serving {
            "healthy"
        } else {
            "unhealthy"
        };
        Self {
            status: status.to_string(),
            state,
            checks: vec![],
        }
    }

    pub fn add_check(&mut self, check: ComponentHealth) {
        if check.status != "healthy" {
            self.status = "unhealthy".to_string();
        }
        self.checks.push(check);
    }

    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

impl ComponentHealth {
    pub fn healthy(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: "healthy".to_string(),
            message: None,
        }
    }

    pub fn unhealthy(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: "unhealthy".to_string(),
            message: Some(message.into()),
        }
    }
}

/// 版本信息
#[derive(Debug, Clone, Serialize)]
pub struct VersionInfo {
    pub name: String,
    pub service: String,
    pub version: String,
    pub commit_hash: String,
    pub environment: String,
}

impl VersionInfo {
    pub fn from_project(project: &ProjectConfig) -> Self {
        Self {
            name: project.name.clone(),
            service: project.service_name.clone(),
            version: project.version.clone(),
            commit_hash: project.commit_hash.clone(),
            environment: project.environment.clone(),
        }
    }
}

#[derive(Clone)]
pub struct StatusState {
    lifecycle: watch::Receiver<BootstrapState>,
    database: Option<Database>,
    version: VersionInfo,
}

impl StatusState {
    pub fn new(
        lifecycle: watch::Receiver<BootstrapState>,
        database: Option<Database>,
        version: VersionInfo,
    ) -> Self {
        Self {
            lifecycle,
            database,
            version,
        }
    }

    /// 执行就绪检查
    pub async fn readiness(&self) -> HealthStatus {
        let state = *self.lifecycle.borrow();
        let mut status = HealthStatus::new(state);

        if let Some(database) = &self.database {
            let check = match database.ping(DATABASE_PING_TIMEOUT).await {
                Ok(_) => ComponentHealth::healthy("postgres"),
                Err(e) => ComponentHealth::unhealthy("postgres", e.to_string()),
            };
            status.add_check(check);
        }
        status
    }
}

pub fn router(state: StatusState) -> Router {
    Router::new()
        .route("/live", get(live_handler))
        .route("/ready", get(ready_handler))
        .route("/version", get(version_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// 启动状态服务器
///
/// 绑定失败只记录日志，返回 None
pub async fn spawn_status_server(config: &StatusConfig, state: StatusState) -> Option<JoinHandle<()>> {
    let address = format!("{}:{}", config.host, config.port);
    let listener = match tokio::net::TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %address, error = %e, "Failed to bind status server, continuing without it");
            return None;
        }
    };
    let local_addr: Option<SocketAddr> = listener.local_addr().ok();
    info!(addr = ?local_addr, "Status HTTP server starting");

    let app = router(state);
    Some(tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "Status server error");
        }
    }))
}

async fn live_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "alive" })))
}

async fn ready_handler(State(state): State<StatusState>) -> impl IntoResponse {
    let status = state.readiness().await;
    let code = if status.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}

async fn version_handler(State(state): State<StatusState>) -> impl IntoResponse {
    Json(state.version)
}

async fn metrics_handler(State(state): State<StatusState>) -> impl IntoResponse {
    if let Some(database) = &state.database {
        metrics::record_pool_status(&database.pool_status());
    }
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4")],
        metrics::render(),
    )
}
