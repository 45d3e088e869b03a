//! 仓储接口

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mesh_errors::AppResult;

use super::entities::{Category, Task};

/// 分类仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// 保存新分类
    async fn create(&self, name: &str) -> AppResult<Category>;

    /// 根据 ID 查找分类
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Category>>;

    /// 按 ID 批量查询，结果按 ID 升序；`ids` 为空时返回全部
    async fn list(&self, ids: &[i64]) -> AppResult<Vec<Category>>;
}

/// 任务仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn create(&self, category_id: i64, description: &str) -> AppResult<Task>;

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Task>>;

    /// 查询分类下的任务，按 ID 升序
    async fn list_by_category(&self, category_id: i64) -> AppResult<Vec<Task>>;

    /// 将未完成的任务标记为完成；任务不存在或已完成时返回 None
    async fn mark_completed(&self, id: i64, at: DateTime<Utc>) -> AppResult<Option<Task>>;
}
