//! 商品业务逻辑
//!
//! 分类信息只通过 [`CategoryCatalog`] 获取；下游失败在这里转换为领域错误

use std::collections::BTreeMap;
use std::sync::Arc;

use mesh_bootstrap::CallContext;
use mesh_errors::{AppError, AppResult};
use tracing::{info, warn};

use crate::domain::{
    CatalogError, CategoryCatalog, ProductDetails, ProductRepository, normalize_name, require_id,
};

/// 单次 ListCategories 最多携带的 ID 数，与分类服务的上限一致
pub const CATEGORY_LOOKUP_BATCH: usize = 1000;

pub struct ProductService {
    repo: Arc<dyn ProductRepository>,
    catalog: Arc<dyn CategoryCatalog>,
}

impl ProductService {
    pub fn new(repo: Arc<dyn ProductRepository>, catalog: Arc<dyn CategoryCatalog>) -> Self {
        Self { repo, catalog }
    }

    /// 创建商品
    ///
    /// 先确认分类存在，再写入本地库
    pub async fn create_product(
        &self,
        ctx: &CallContext,
        name: &str,
        category_id: i64,
    ) -> AppResult<ProductDetails> {
        let name = normalize_name(name)?;
        let category_id = require_id("category_id", category_id)?;

        let category = self
            .catalog
            .get_category(ctx, category_id)
            .await
            .map_err(|e| match e {
                CatalogError::NotFound(id) => {
                    AppError::validation(format!("category {id} does not exist"))
                }
                other => other.into(),
            })?;

        let product = self.repo.create(&name, category.id).await?;
        info!(
            product_id = product.id,
            category_id = category.id,
            caller = %ctx.caller().service,
            "Product created"
        );
        Ok(ProductDetails::new(product, category.name))
    }

    pub async fn get_product(&self, ctx: &CallContext, id: i64) -> AppResult<ProductDetails> {
        let id = require_id("id", id)?;
        let product = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("product {id} not found")))?;

        match self.catalog.get_category(ctx, product.category_id).await {
            Ok(category) => Ok(ProductDetails::new(product, category.name)),
            Err(CatalogError::NotFound(category_id)) => {
                warn!(product_id = id, category_id, "Category of product no longer exists");
                Ok(ProductDetails::new(product, ""))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 列出商品，分类名称通过批量查询补全（每批至多 1000 个 ID）
    pub async fn list_products(
        &self,
        ctx: &CallContext,
        category_id: Option<i64>,
    ) -> AppResult<Vec<ProductDetails>> {
        if let Some(category_id) = category_id {
            require_id("category_id", category_id)?;
        }

        let products = self.repo.list(category_id).await?;
        if products.is_empty() {
            return Ok(Vec::new());
        }

        let mut ids: Vec<i64> = products.iter().map(|p| p.category_id).collect();
        ids.sort_unstable();
        ids.dedup();

        let mut names: BTreeMap<i64, String> = BTreeMap::new();
        for batch in ids.chunks(CATEGORY_LOOKUP_BATCH) {
            let categories = self.catalog.list_categories(ctx, batch).await?;
            names.extend(categories.into_iter().map(|c| (c.id, c.name)));
        }

        Ok(products
            .into_iter()
            .map(|product| {
                let name = names.get(&product.category_id).cloned().unwrap_or_default();
                ProductDetails::new(product, name)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CategoryRef, MockCategoryCatalog, MockProductRepository, Product};
    use chrono::Utc;
    use mesh_errors::DownstreamCallError;
    use mockall::predicate::eq;

    fn product(id: i64, name: &str, category_id: i64) -> Product {
        Product {
            id,
            name: name.to_string(),
            category_id,
            created_at: Utc::now(),
        }
    }

    fn category(id: i64, name: &str) -> CategoryRef {
        CategoryRef {
            id,
            name: name.to_string(),
        }
    }

    fn unavailable() -> CatalogError {
        CatalogError::Downstream(DownstreamCallError::from_status(
            "category_service",
            &tonic::Status::unavailable("connection refused"),
        ))
    }

    fn service(repo: MockProductRepository, catalog: MockCategoryCatalog) -> ProductService {
        ProductService::new(Arc::new(repo), Arc::new(catalog))
    }

    #[tokio::test]
    async fn test_create_checks_category_then_persists() {
        let mut catalog = MockCategoryCatalog::new();
        catalog
            .expect_get_category()
            .withf(|_, id| *id == 7)
            .times(1)
            .returning(|_, id| Ok(category(id, "Books")));

        let mut repo = MockProductRepository::new();
        repo.expect_create()
            .withf(|name, category_id| name == "Novel" && *category_id == 7)
            .times(1)
            .returning(|name, category_id| Ok(product(1, name, category_id)));

        let details = service(repo, catalog)
            .create_product(&CallContext::detached(), " Novel ", 7)
            .await
            .unwrap();
        assert_eq!(details.category_name, "Books");
        assert_eq!(details.product.name, "Novel");
    }

    #[tokio::test]
    async fn test_create_with_missing_category_is_validation() {
        let mut catalog = MockCategoryCatalog::new();
        catalog
            .expect_get_category()
            .returning(|_, id| Err(CatalogError::NotFound(id)));
        let mut repo = MockProductRepository::new();
        repo.expect_create().never();

        let err = service(repo, catalog)
            .create_product(&CallContext::detached(), "Novel", 42)
            .await
            .unwrap_err();
        match err {
            AppError::Validation(msg) => assert_eq!(msg, "category 42 does not exist"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_with_unavailable_catalog() {
        let mut catalog = MockCategoryCatalog::new();
        catalog.expect_get_category().returning(|_, _| Err(unavailable()));
        let mut repo = MockProductRepository::new();
        repo.expect_create().never();

        let err = service(repo, catalog)
            .create_product(&CallContext::detached(), "Novel", 42)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DependencyUnavailable(_)));
    }

    #[tokio::test]
    async fn test_create_validates_before_calling_catalog() {
        let mut catalog = MockCategoryCatalog::new();
        catalog.expect_get_category().never();

        let svc = service(MockProductRepository::new(), catalog);
        let ctx = CallContext::detached();
        assert!(matches!(
            svc.create_product(&ctx, "  ", 1).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            svc.create_product(&ctx, "Novel", 0).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_get_missing_product() {
        let mut repo = MockProductRepository::new();
        repo.expect_find_by_id().with(eq(5)).returning(|_| Ok(None));
        let mut catalog = MockCategoryCatalog::new();
        catalog.expect_get_category().never();

        let err = service(repo, catalog)
            .get_product(&CallContext::detached(), 5)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_get_with_deleted_category_keeps_product() {
        let mut repo = MockProductRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(product(id, "Novel", 3))));
        let mut catalog = MockCategoryCatalog::new();
        catalog
            .expect_get_category()
            .returning(|_, id| Err(CatalogError::NotFound(id)));

        let details = service(repo, catalog)
            .get_product(&CallContext::detached(), 1)
            .await
            .unwrap();
        assert_eq!(details.category_name, "");
    }

    #[tokio::test]
    async fn test_get_with_unavailable_catalog() {
        let mut repo = MockProductRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(product(id, "Novel", 3))));
        let mut catalog = MockCategoryCatalog::new();
        catalog.expect_get_category().returning(|_, _| Err(unavailable()));

        let err = service(repo, catalog)
            .get_product(&CallContext::detached(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DependencyUnavailable(_)));
    }

    #[tokio::test]
    async fn test_list_enriches_with_one_batched_call() {
        let mut repo = MockProductRepository::new();
        repo.expect_list().with(eq(None)).returning(|_| {
            Ok(vec![
                product(1, "Novel", 3),
                product(2, "Atlas", 1),
                product(3, "Poems", 3),
            ])
        });
        let mut catalog = MockCategoryCatalog::new();
        catalog
            .expect_list_categories()
            .withf(|_, ids| ids.to_vec() == vec![1, 3])
            .times(1)
            .returning(|_, _| Ok(vec![category(1, "Maps"), category(3, "Books")]));
        catalog.expect_get_category().never();

        let list = service(repo, catalog)
            .list_products(&CallContext::detached(), None)
            .await
            .unwrap();
        let names: Vec<&str> = list.iter().map(|d| d.category_name.as_str()).collect();
        assert_eq!(names, vec!["Books", "Maps", "Books"]);
    }

    #[tokio::test]
    async fn test_list_splits_category_lookup_into_bounded_batches() {
        let count = CATEGORY_LOOKUP_BATCH as i64 + 1;
        let mut repo = MockProductRepository::new();
        repo.expect_list().returning(move |_| {
            Ok((1..=count).map(|id| product(id, "Item", id)).collect())
        });
        let mut catalog = MockCategoryCatalog::new();
        catalog
            .expect_list_categories()
            .times(2)
            .returning(|_, ids| {
                assert!(ids.len() <= CATEGORY_LOOKUP_BATCH, "batch of {}", ids.len());
                Ok(ids.iter().map(|id| category(*id, &format!("c{id}"))).collect())
            });

        let list = service(repo, catalog)
            .list_products(&CallContext::detached(), None)
            .await
            .unwrap();
        assert_eq!(list.len(), count as usize);
        assert_eq!(list.last().unwrap().category_name, format!("c{count}"));
    }

    #[tokio::test]
    async fn test_list_empty_skips_catalog() {
        let mut repo = MockProductRepository::new();
        repo.expect_list().returning(|_| Ok(vec![]));
        let mut catalog = MockCategoryCatalog::new();
        catalog.expect_list_categories().never();

        let list = service(repo, catalog)
            .list_products(&CallContext::detached(), Some(4))
            .await
            .unwrap();
        assert!(list.is_empty());
    }
}
