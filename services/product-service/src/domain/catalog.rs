//! 分类目录：商品服务对分类服务的依赖
//!
//! 实现位于基础设施层（gRPC 客户端桩），测试中用 mock 或内存替身

use async_trait::async_trait;
use mesh_bootstrap::CallContext;
use mesh_errors::{AppError, DownstreamCallError};
use thiserror::Error;

/// 分类的只读视图
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("category {0} does not exist")]
    NotFound(i64),

    #[error(transparent)]
    Downstream(#[from] DownstreamCallError),
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(id) => AppError::not_found(format!("category {id} not found")),
            CatalogError::Downstream(e) => e.into(),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryCatalog: Send + Sync {
    /// 查询单个分类；不存在时返回 `CatalogError::NotFound`
    async fn get_category(&self, ctx: &CallContext, id: i64) -> Result<CategoryRef, CatalogError>;

    /// 批量查询，不存在的 ID 被忽略
    async fn list_categories(
        &self,
        ctx: &CallContext,
        ids: &[i64],
    ) -> Result<Vec<CategoryRef>, CatalogError>;
}
