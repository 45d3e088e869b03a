//! 领域对象与 proto 消息的转换

use chrono::{DateTime, Utc};

use crate::category::v1 as pb;
use crate::domain::{Category, Task};

pub fn to_timestamp(at: DateTime<Utc>) -> prost_types::Timestamp {
    prost_types::Timestamp {
        seconds: at.timestamp(),
        nanos: at.timestamp_subsec_nanos() as i32,
    }
}

impl From<Category> for pb::Category {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            created_at: Some(to_timestamp(category.created_at)),
        }
    }
}

impl From<Task> for pb::Task {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            category_id: task.category_id,
            description: task.description,
            completed: task.completed,
            created_at: Some(to_timestamp(task.created_at)),
            completed_at: task.completed_at.map(to_timestamp),
        }
    }
}
