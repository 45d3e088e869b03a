//! mesh-bootstrap - 统一服务启动骨架
//!
//! 所有服务复用的启动逻辑：基础设施提供、出站拦截器、
//! 调用上下文、gRPC 服务组装与状态端点

mod context;
mod error;
mod health;
mod infrastructure;
mod interceptor;
mod lifecycle;
mod metrics;
mod reflection;
mod runtime;
mod server;
mod starter;

pub use context::*;
pub use error::*;
pub use health::{ComponentHealth, HealthStatus, StatusState, VersionInfo, router as status_router};
pub use infrastructure::*;
pub use interceptor::*;
pub use lifecycle::*;
pub use metrics::{GrpcMetricsLayer, install_recorder, record_grpc_request, render as render_metrics};
pub use reflection::build_reflection;
pub use runtime::*;
pub use server::*;
pub use starter::*;
