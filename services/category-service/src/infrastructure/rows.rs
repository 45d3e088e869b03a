//! 数据库行映射结构

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::domain::{Category, Task};

#[derive(Debug, FromRow)]
pub struct CategoryRow {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
pub struct TaskRow {
    pub id: i64,
    pub category_id: i64,
    pub description: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Self {
            id: row.id,
            category_id: row.category_id,
            description: row.description,
            completed: row.completed,
            created_at: row.created_at,
            completed_at: row.completed_at,
        }
    }
}
