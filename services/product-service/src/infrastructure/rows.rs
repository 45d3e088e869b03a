//! 数据库行映射结构

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::domain::Product;

#[derive(Debug, FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub name: String,
    pub category_id: i64,
    pub created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            category_id: row.category_id,
            created_at: row.created_at,
        }
    }
}
