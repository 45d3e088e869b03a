//! PostgreSQL repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mesh_errors::{AppError, AppResult};
use sqlx::PgPool;

use crate::domain::{Category, CategoryRepository, Task, TaskRepository};

use super::rows::{CategoryRow, TaskRow};

// ============================================================================
// CategoryRepository 实现
// ============================================================================

pub struct PostgresCategoryRepository {
    pool: PgPool,
}

impl PostgresCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn create(&self, name: &str) -> AppResult<Category> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r#"
            INSERT INTO categories (name)
            VALUES ($1)
            RETURNING id, name, created_at
            "#,
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to insert category: {e}")))?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Category>> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, created_at FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to query category: {e}")))?;

        Ok(row.map(Into::into))
    }

    async fn list(&self, ids: &[i64]) -> AppResult<Vec<Category>> {
        let rows = if ids.is_empty() {
            sqlx::query_as::<_, CategoryRow>(
                "SELECT id, name, created_at FROM categories ORDER BY id",
            )
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, CategoryRow>(
                "SELECT id, name, created_at FROM categories WHERE id = ANY($1) ORDER BY id",
            )
            .bind(ids)
            .fetch_all(&self.pool)
            .await
        }
        .map_err(|e| AppError::database(format!("Failed to list categories: {e}")))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

// ============================================================================
// TaskRepository 实现
// ============================================================================

pub struct PostgresTaskRepository {
    pool: PgPool,
}

impl PostgresTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn create(&self, category_id: i64, description: &str) -> AppResult<Task> {
        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            INSERT INTO tasks (category_id, description)
            VALUES ($1, $2)
            RETURNING id, category_id, description, completed, created_at, completed_at
            "#,
        )
        .bind(category_id)
        .bind(description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to insert task: {e}")))?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Task>> {
        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT id, category_id, description, completed, created_at, completed_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to query task: {e}")))?;

        Ok(row.map(Into::into))
    }

    async fn list_by_category(&self, category_id: i64) -> AppResult<Vec<Task>> {
        let rows = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT id, category_id, description, completed, created_at, completed_at
            FROM tasks
            WHERE category_id = $1
            ORDER BY id
            "#,
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list tasks: {e}")))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn mark_completed(&self, id: i64, at: DateTime<Utc>) -> AppResult<Option<Task>> {
        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            UPDATE tasks
            SET completed = TRUE, completed_at = $2
            WHERE id = $1 AND NOT completed
            RETURNING id, category_id, description, completed, created_at, completed_at
            "#,
        )
        .bind(id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to complete task: {e}")))?;

        Ok(row.map(Into::into))
    }
}
