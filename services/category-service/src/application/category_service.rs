//! 分类业务逻辑

use std::sync::Arc;

use mesh_errors::{AppError, AppResult};
use tracing::info;

use crate::domain::{Category, CategoryRepository, MAX_CATEGORY_NAME_LEN, normalize_text, require_id};

/// 单次批量查询允许的最大 ID 数
pub const MAX_LIST_IDS: usize = 1000;

pub struct CategoryService {
    repo: Arc<dyn CategoryRepository>,
}

impl CategoryService {
    pub fn new(repo: Arc<dyn CategoryRepository>) -> Self {
        Self { repo }
    }

    /// 创建分类
    pub async fn create_category(&self, name: &str) -> AppResult<Category> {
        let name = normalize_text("name", name, MAX_CATEGORY_NAME_LEN)?;
        let category = self.repo.create(&name).await?;
        info!(category_id = category.id, "Category created");
        Ok(category)
    }

    pub async fn get_category(&self, id: i64) -> AppResult<Category> {
        let id = require_id("id", id)?;
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("category {id} not found")))
    }

    /// 批量查询；不存在的 ID 被忽略
    pub async fn list_categories(&self, ids: &[i64]) -> AppResult<Vec<Category>> {
        if ids.len() > MAX_LIST_IDS {
            return Err(AppError::validation(format!(
                "at most {MAX_LIST_IDS} ids per request"
            )));
        }
        for id in ids {
            require_id("ids", *id)?;
        }

        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        self.repo.list(&ids).await
    }
}
