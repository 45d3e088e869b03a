//! Metrics 模块
//!
//! Prometheus 导出与 gRPC 请求指标层

use std::sync::OnceLock;
use std::task::{Context, Poll};
use std::time::Instant;

use futures::future::BoxFuture;
use mesh_adapter_postgres::PoolStatus;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tower::{Layer, Service};
use tracing::warn;

static PROMETHEUS: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

/// 安装进程级 Prometheus 记录器，重复调用无副作用
///
/// 启动阶段调用；安装之前记录的指标会丢失。其他记录器已安装时返回 None
pub fn install_recorder() -> Option<&'static PrometheusHandle> {
    PROMETHEUS
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(error = %e, "Failed to install Prometheus recorder, metrics disabled");
                None
            }
        })
        .as_ref()
}

/// 渲染 Prometheus 文本格式；记录器未安装时为空
pub fn render() -> String {
    PROMETHEUS
        .get()
        .and_then(Option::as_ref)
        .map(|handle| handle.render())
        .unwrap_or_default()
}

/// 记录 gRPC 请求
pub fn record_grpc_request(path: &str, status: &str, duration_ms: f64) {
    let labels = [
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];

    counter!("grpc_requests_total", &labels).increment(1);
    histogram!("grpc_request_duration_ms", &labels).record(duration_ms);
}

/// 记录 PostgreSQL 连接池指标
pub fn record_pool_status(status: &PoolStatus) {
    gauge!("postgres_pool_size").set(status.size as f64);
    gauge!("postgres_pool_idle").set(status.idle as f64);
    gauge!("postgres_pool_active").set(status.active as f64);

    let utilization = if status.size > 0 {
        (status.active as f64 / status.size as f64) * 100.0
    } else {
        0.0
    };
    gauge!("postgres_pool_utilization").set(utilization);
}

/// 为每个请求记录次数与耗时的 tower 层
#[derive(Debug, Clone, Copy, Default)]
pub struct GrpcMetricsLayer;

impl<S> Layer<S> for GrpcMetricsLayer {
    type Service = GrpcMetricsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        GrpcMetricsService { inner }
    }
}

#[derive(Debug, Clone)]
pub struct GrpcMetricsService<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<http::Request<ReqBody>> for GrpcMetricsService<S>
where
    S: Service<http::Request<ReqBody>, Response = http::Response<ResBody>>,
    S::Future: Send + 'static,
    S::Error: 'static,
    ResBody: 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: http::Request<ReqBody>) -> Self::Future {
        let path = request.uri().path().to_string();
        let start = Instant::now();
        let future = self.inner.call(request);

        Box::pin(async move {
            let result = future.await;
            let status = match &result {
                Ok(response) => grpc_status_label(response.headers()),
                Err(_) => "error".to_string(),
            };
            record_grpc_request(&path, &status, start.elapsed().as_secs_f64() * 1000.0);
            result
        })
    }
}

/// 一元调用出错时状态码位于响应头（trailers-only），成功时位于 trailer
fn grpc_status_label(headers: &http::HeaderMap) -> String {
    headers
        .get("grpc-status")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("0")
        .to_string()
}
