//! gRPC 服务组装
//!
//! 组装（注册服务）、绑定（失败即致命）、运行（阻塞到关闭信号）三步分离

use std::convert::Infallible;
use std::future::Future;
use std::io::ErrorKind;
use std::net::SocketAddr;

use mesh_config::GrpcConfig;
use mesh_errors::AppError;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::body::Body;
use tonic::server::NamedService;
use tonic::service::{Routes, RoutesBuilder};
use tonic::transport::Server;
use tracing::info;

use crate::error::{BindError, ServeError};
use crate::metrics::GrpcMetricsLayer;
use crate::reflection::build_reflection;

/// 尚未绑定的 gRPC 服务器
pub struct GrpcServer {
    config: GrpcConfig,
    routes: RoutesBuilder,
    services: Vec<&'static str>,
}

impl GrpcServer {
    pub fn new(config: &GrpcConfig) -> Self {
        Self {
            config: config.clone(),
            routes: RoutesBuilder::default(),
            services: Vec::new(),
        }
    }

    /// 注册一个生成的服务实现
    pub fn add_service<S>(mut self, service: S) -> Self
    where
        S: tower::Service<http::Request<Body>, Error = Infallible>
            + NamedService
            + Clone
            + Send
            + Sync
            + 'static,
        S::Response: axum::response::IntoResponse,
        S::Future: Send + 'static,
    {
        self.services.push(S::NAME);
        self.routes.add_service(service);
        self
    }

    /// 注册 gRPC 反射服务
    pub fn with_reflection(self, descriptor_sets: &[&'static [u8]]) -> Result<Self, AppError> {
        let reflection = build_reflection(descriptor_sets.to_vec())
            .map_err(|e| AppError::internal(format!("Invalid file descriptor set: {e}")))?;
        Ok(self.add_service(reflection))
    }

    pub fn services(&self) -> &[&'static str] {
        &self.services
    }

    /// 绑定监听地址
    ///
    /// 端口 0 由系统分配；其余低于 `min_port` 的端口被拒绝
    pub async fn bind(self) -> Result<BoundServer, BindError> {
        let port = self.config.port;
        if port != 0 && port < self.config.min_port {
            return Err(BindError::PortNotAllowed {
                port,
                min_port: self.config.min_port,
            });
        }

        let address = self.config.address();
        let addr = tokio::net::lookup_host(&address)
            .await
            .map_err(|e| BindError::Invalid {
                addr: address.clone(),
                reason: e.to_string(),
            })?
            .next()
            .ok_or_else(|| BindError::Invalid {
                addr: address.clone(),
                reason: "host resolved to no addresses".to_string(),
            })?;

        let listener = TcpListener::bind(addr).await.map_err(|e| match e.kind() {
            ErrorKind::AddrInUse => BindError::AddressInUse(addr),
            _ => BindError::Io {
                addr: address.clone(),
                source: e,
            },
        })?;
        let local_addr = listener.local_addr().map_err(|e| BindError::Io {
            addr: address,
            source: e,
        })?;

        Ok(BoundServer {
            config: self.config,
            routes: self.routes.routes(),
            services: self.services,
            listener,
            local_addr,
        })
    }
}

/// 已绑定、尚未开始服务的 gRPC 服务器
pub struct BoundServer {
    config: GrpcConfig,
    routes: Routes,
    services: Vec<&'static str>,
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl BoundServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// 开始服务，直到 `shutdown` 完成
    pub async fn serve<F>(self, shutdown: F) -> Result<(), ServeError>
    where
        F: Future<Output = ()>,
    {
        info!(
            addr = %self.local_addr,
            services = ?self.services,
            "gRPC server listening"
        );

        Server::builder()
            .timeout(self.config.timeout())
            .http2_keepalive_interval(Some(self.config.keepalive_interval()))
            .http2_keepalive_timeout(Some(self.config.keepalive_timeout()))
            .layer(GrpcMetricsLayer)
            .add_routes(self.routes)
            .serve_with_incoming_shutdown(TcpListenerStream::new(self.listener), shutdown)
            .await?;

        info!("gRPC server stopped");
        Ok(())
    }
}
