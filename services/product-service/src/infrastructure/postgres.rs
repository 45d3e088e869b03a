//! PostgreSQL repository implementation

use async_trait::async_trait;
use mesh_errors::{AppError, AppResult};
use sqlx::PgPool;

use crate::domain::{Product, ProductRepository};

use super::rows::ProductRow;

pub struct PostgresProductRepository {
    pool: PgPool,
}

impl PostgresProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for PostgresProductRepository {
    async fn create(&self, name: &str, category_id: i64) -> AppResult<Product> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            INSERT INTO products (name, category_id)
            VALUES ($1, $2)
            RETURNING id, name, category_id, created_at
            "#,
        )
        .bind(name)
        .bind(category_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to insert product: {e}")))?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, category_id, created_at FROM products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to query product: {e}")))?;

        Ok(row.map(Into::into))
    }

    async fn list(&self, category_id: Option<i64>) -> AppResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, name, category_id, created_at
            FROM products
            WHERE $1::BIGINT IS NULL OR category_id = $1
            ORDER BY id
            "#,
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list products: {e}")))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
