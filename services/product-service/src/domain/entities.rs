//! 商品实体

use chrono::{DateTime, Utc};
use mesh_errors::{AppError, AppResult};

pub const MAX_PRODUCT_NAME_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub category_id: i64,
    pub created_at: DateTime<Utc>,
}

/// 附带分类名称的商品，返回给调用方
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDetails {
    pub product: Product,
    /// 分类已被删除时为空
    pub category_name: String,
}

impl ProductDetails {
    pub fn new(product: Product, category_name: impl Into<String>) -> Self {
        Self {
            product,
            category_name: category_name.into(),
        }
    }
}

/// 校验并规整商品名称
pub fn normalize_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("name must not be empty"));
    }
    if name.chars().count() > MAX_PRODUCT_NAME_LEN {
        return Err(AppError::validation(format!(
            "name must be at most {MAX_PRODUCT_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

pub fn require_id(field: &str, id: i64) -> AppResult<i64> {
    if id <= 0 {
        return Err(AppError::validation(format!("{field} must be positive")));
    }
    Ok(id)
}
