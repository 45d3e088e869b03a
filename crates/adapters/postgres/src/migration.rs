//! PostgreSQL 迁移管理模块

use sqlx::migrate::Migrator;
use tracing::info;

use crate::connection::{ConnectionError, Database};

impl Database {
    /// 执行嵌入的迁移；已应用的版本会被跳过
    pub async fn migrate(&self, migrator: &Migrator) -> Result<(), ConnectionError> {
        let pending = migrator.iter().count();
        info!(migrations = pending, "Running database migrations");

        migrator
            .run(self.pool())
            .await
            .map_err(ConnectionError::Migration)?;

        info!("Database migrations complete");
        Ok(())
    }
}
