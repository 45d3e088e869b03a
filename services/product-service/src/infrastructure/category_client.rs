//! 通过 gRPC 客户端桩访问分类服务
//!
//! 只读调用在操作内部按策略重试 UNAVAILABLE；
//! 截止时间超时与取消说明调用方已放弃，不重试。

use async_trait::async_trait;
use mesh_bootstrap::{CallContext, InterceptedChannel};
use mesh_common::{RetryPolicy, retry_when};
use mesh_errors::DownstreamCallError;
use tonic::Status;
use tracing::{debug, warn};

use crate::category::v1 as pb;
use crate::category::v1::category_service_client::CategoryServiceClient;
use crate::domain::{CatalogError, CategoryCatalog, CategoryRef};

/// 配置中分类服务的下游名称
pub const CATEGORY_SERVICE: &str = "category_service";

fn classify(status: &Status) -> DownstreamCallError {
    DownstreamCallError::from_status(CATEGORY_SERVICE, status)
}

fn is_retryable(status: &Status) -> bool {
    classify(status).is_retryable()
}

impl From<pb::Category> for CategoryRef {
    fn from(category: pb::Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
        }
    }
}

#[derive(Clone)]
pub struct GrpcCategoryCatalog {
    client: CategoryServiceClient<InterceptedChannel>,
    retry: RetryPolicy,
}

impl GrpcCategoryCatalog {
    pub fn new(channel: InterceptedChannel) -> Self {
        Self {
            client: CategoryServiceClient::new(channel),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[async_trait]
impl CategoryCatalog for GrpcCategoryCatalog {
    async fn get_category(&self, ctx: &CallContext, id: i64) -> Result<CategoryRef, CatalogError> {
        let result = retry_when(
            &self.retry,
            "category.get_category_by_id",
            || {
                let mut client = self.client.clone();
                let request = ctx.outgoing(pb::GetCategoryByIdRequest { id });
                async move { client.get_category_by_id(request?).await }
            },
            is_retryable,
        )
        .await;

        match result {
            Ok(response) => {
                debug!(category_id = id, "Category resolved");
                response
                    .into_inner()
                    .category
                    .map(CategoryRef::from)
                    .ok_or_else(|| {
                        CatalogError::Downstream(classify(&Status::internal(
                            "response without category",
                        )))
                    })
            }
            Err(status) => {
                let err = classify(&status);
                if err.is_not_found() {
                    return Err(CatalogError::NotFound(id));
                }
                warn!(
                    category_id = id,
                    code = ?status.code(),
                    message = status.message(),
                    "Category lookup failed"
                );
                Err(CatalogError::Downstream(err))
            }
        }
    }

    async fn list_categories(
        &self,
        ctx: &CallContext,
        ids: &[i64],
    ) -> Result<Vec<CategoryRef>, CatalogError> {
        let result = retry_when(
            &self.retry,
            "category.list_categories",
            || {
                let mut client = self.client.clone();
                let request = ctx.outgoing(pb::ListCategoriesRequest { ids: ids.to_vec() });
                async move { client.list_categories(request?).await }
            },
            is_retryable,
        )
        .await;

        match result {
            Ok(response) => Ok(response
                .into_inner()
                .categories
                .into_iter()
                .map(CategoryRef::from)
                .collect()),
            Err(status) => {
                warn!(
                    count = ids.len(),
                    code = ?status.code(),
                    message = status.message(),
                    "Category batch lookup failed"
                );
                Err(CatalogError::Downstream(classify(&status)))
            }
        }
    }
}
