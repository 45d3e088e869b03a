//! 分类与任务实体

use chrono::{DateTime, Utc};
use mesh_errors::{AppError, AppResult};

pub const MAX_CATEGORY_NAME_LEN: usize = 100;
pub const MAX_TASK_DESCRIPTION_LEN: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: i64,
    pub category_id: i64,
    pub description: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// 去掉首尾空白后检查长度（按字符计）
pub fn normalize_text(field: &str, value: &str, max_len: usize) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if value.chars().count() > max_len {
        return Err(AppError::validation(format!(
            "{field} must be at most {max_len} characters"
        )));
    }
    Ok(value.to_string())
}

pub fn require_id(field: &str, id: i64) -> AppResult<i64> {
    if id <= 0 {
        return Err(AppError::validation(format!("{field} must be positive")));
    }
    Ok(id)
}
