//! 任务业务逻辑

use std::sync::Arc;

use chrono::Utc;
use mesh_errors::{AppError, AppResult};
use tracing::info;

use crate::domain::{
    CategoryRepository, MAX_TASK_DESCRIPTION_LEN, Task, TaskRepository, normalize_text, require_id,
};

pub struct TaskService {
    tasks: Arc<dyn TaskRepository>,
    categories: Arc<dyn CategoryRepository>,
}

impl TaskService {
    pub fn new(tasks: Arc<dyn TaskRepository>, categories: Arc<dyn CategoryRepository>) -> Self {
        Self { tasks, categories }
    }

    async fn ensure_category(&self, category_id: i64) -> AppResult<()> {
        let category_id = require_id("category_id", category_id)?;
        match self.categories.find_by_id(category_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::not_found(format!(
                "category {category_id} not found"
            ))),
        }
    }

    /// 在已存在的分类下创建任务
    pub async fn create_task(&self, category_id: i64, description: &str) -> AppResult<Task> {
        let description = normalize_text("description", description, MAX_TASK_DESCRIPTION_LEN)?;
        self.ensure_category(category_id).await?;

        let task = self.tasks.create(category_id, &description).await?;
        info!(task_id = task.id, category_id, "Task created");
        Ok(task)
    }

    pub async fn list_tasks(&self, category_id: i64) -> AppResult<Vec<Task>> {
        self.ensure_category(category_id).await?;
        self.tasks.list_by_category(category_id).await
    }

    /// 完成任务；重复完成返回 Conflict
    pub async fn complete_task(&self, task_id: i64) -> AppResult<Task> {
        let task_id = require_id("task_id", task_id)?;
        let task = self
            .tasks
            .find_by_id(task_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("task {task_id} not found")))?;
        if task.completed {
            return Err(AppError::conflict(format!("task {task_id} is already completed")));
        }

        // 并发完成时条件更新不命中
        let task = self
            .tasks
            .mark_completed(task_id, Utc::now())
            .await?
            .ok_or_else(|| AppError::conflict(format!("task {task_id} is already completed")))?;
        info!(task_id, "Task completed");
        Ok(task)
    }
}
