//! mesh-errors - 统一错误处理
//!
//! 请求阶段的错误分类：领域错误返回给 RPC 调用方，下游调用错误在调用方服务内被转换

use thiserror::Error;

/// 应用错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Dependency unavailable: {0}")]
    DependencyUnavailable(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn dependency_unavailable(msg: impl Into<String>) -> Self {
        Self::DependencyUnavailable(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// 转换为 gRPC 状态码
    pub fn grpc_code(&self) -> tonic::Code {
        match self {
            Self::NotFound(_) => tonic::Code::NotFound,
            Self::Validation(_) => tonic::Code::InvalidArgument,
            Self::Conflict(_) => tonic::Code::AlreadyExists,
            Self::DependencyUnavailable(_) => tonic::Code::Unavailable,
            Self::Database(_) => tonic::Code::Internal,
            Self::Internal(_) => tonic::Code::Internal,
        }
    }

    /// 错误种类（用于日志与指标标签）
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation",
            Self::Conflict(_) => "conflict",
            Self::DependencyUnavailable(_) => "dependency_unavailable",
            Self::Database(_) => "database",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<AppError> for tonic::Status {
    fn from(err: AppError) -> Self {
        // 数据库细节不暴露给调用方
        match err {
            AppError::Database(_) => tonic::Status::internal("Database error"),
            other => tonic::Status::new(other.grpc_code(), other.to_string()),
        }
    }
}

/// 下游服务调用失败
///
/// 由客户端桩返回的 `tonic::Status` 构造；只在调用方服务内部流转，
/// 最终总是被转换为 [`AppError`]。
#[derive(Debug, Clone, Error)]
#[error("call to {service} failed ({code:?}): {message}")]
pub struct DownstreamCallError {
    pub service: String,
    pub code: tonic::Code,
    pub message: String,
}

impl DownstreamCallError {
    pub fn from_status(service: impl Into<String>, status: &tonic::Status) -> Self {
        Self {
            service: service.into(),
            code: status.code(),
            message: status.message().to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.code == tonic::Code::NotFound
    }

    /// 是否值得在同一次操作内重试
    ///
    /// 只有 UNAVAILABLE 可重试；超时与取消意味着上游已放弃，不再重试
    pub fn is_retryable(&self) -> bool {
        self.code == tonic::Code::Unavailable
    }
}

impl From<DownstreamCallError> for AppError {
    fn from(err: DownstreamCallError) -> Self {
        AppError::DependencyUnavailable(format!("{} is unavailable: {}", err.service, err.message))
    }
}

/// Result 类型别名
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grpc_code_mapping() {
        assert_eq!(AppError::not_found("x").grpc_code(), tonic::Code::NotFound);
        assert_eq!(AppError::validation("x").grpc_code(), tonic::Code::InvalidArgument);
        assert_eq!(AppError::conflict("x").grpc_code(), tonic::Code::AlreadyExists);
        assert_eq!(
            AppError::dependency_unavailable("x").grpc_code(),
            tonic::Code::Unavailable
        );
        assert_eq!(AppError::internal("x").grpc_code(), tonic::Code::Internal);
    }

    #[test]
    fn test_database_error_is_masked() {
        let status: tonic::Status = AppError::database("relation \"products\" does not exist").into();
        assert_eq!(status.code(), tonic::Code::Internal);
        assert!(!status.message().contains("products"));
    }

    #[test]
    fn test_downstream_timeout_becomes_dependency_unavailable() {
        let status = tonic::Status::deadline_exceeded("timeout expired");
        let err = DownstreamCallError::from_status("category-service", &status);
        assert!(!err.is_retryable());

        let app: AppError = err.into();
        assert!(matches!(app, AppError::DependencyUnavailable(_)));

        let status: tonic::Status = app.into();
        assert_eq!(status.code(), tonic::Code::Unavailable);
        assert!(status.message().contains("category-service"));
    }

    #[test]
    fn test_downstream_classification() {
        let not_found = DownstreamCallError::from_status("c", &tonic::Status::not_found("no"));
        assert!(not_found.is_not_found());
        assert!(!not_found.is_retryable());

        let unavailable = DownstreamCallError::from_status("c", &tonic::Status::unavailable("down"));
        assert!(unavailable.is_retryable());
    }
}
