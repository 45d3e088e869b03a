//! PostgreSQL 连接管理
//!
//! 初始化受截止时间约束：超时直接失败，不会挂住进程

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::PostgresConfig;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Invalid database configuration: {0}")]
    InvalidDsn(String),

    #[error("Database not reachable within {0:?}")]
    Timeout(Duration),

    #[error("Failed to connect to database: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("Database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

/// 进程内共享的数据库句柄
///
/// 克隆只增加引用，连接池本身只有一个；`close` 消耗句柄，保证只关闭一次
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// 打开连接池，并在 `config.connect_timeout` 内完成首个连接
    pub async fn open(config: &PostgresConfig) -> Result<Self, ConnectionError> {
        let options = config.connect_options()?;
        let deadline = config.connect_timeout;

        let connect = PgPoolOptions::new()
            .max_connections(config.pool_max)
            .min_connections(config.pool_min)
            .acquire_timeout(deadline)
            .idle_timeout(config.idle_timeout)
            .connect_with(options);

        let pool = tokio::time::timeout(deadline, connect)
            .await
            .map_err(|_| ConnectionError::Timeout(deadline))?
            .map_err(|e| match e {
                sqlx::Error::PoolTimedOut => ConnectionError::Timeout(deadline),
                sqlx::Error::Configuration(reason) => ConnectionError::InvalidDsn(reason.to_string()),
                other => ConnectionError::Connect(other),
            })?;

        info!(
            max_connections = config.pool_max,
            min_connections = config.pool_min,
            "PostgreSQL connection pool created"
        );
        Ok(Self { pool })
    }

    /// 获取连接池
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 关闭连接池，等待借出的连接归还
    pub async fn close(self) {
        debug!("Closing PostgreSQL connection pool");
        self.pool.close().await;
        info!("PostgreSQL connection pool closed");
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}
