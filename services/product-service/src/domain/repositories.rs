//! 仓储接口

use async_trait::async_trait;
use mesh_errors::AppResult;

use super::entities::Product;

/// 商品仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// 保存新商品
    async fn create(&self, name: &str, category_id: i64) -> AppResult<Product>;

    /// 根据 ID 查找商品
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Product>>;

    /// 按 ID 升序列出商品，可按分类过滤
    async fn list(&self, category_id: Option<i64>) -> AppResult<Vec<Product>>;
}
