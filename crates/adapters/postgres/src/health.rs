//! PostgreSQL 健康检查模块
//!
//! 供就绪检查使用的带超时 ping 与连接池状态

use std::time::{Duration, Instant};

use tracing::debug;

use crate::connection::{ConnectionError, Database};

/// 连接池状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    /// 连接池大小
    pub size: u32,
    /// 空闲连接数
    pub idle: u32,
    /// 活跃连接数
    pub active: u32,
}

impl Database {
    /// 执行 `SELECT 1`，返回往返耗时
    pub async fn ping(&self, timeout: Duration) -> Result<Duration, ConnectionError> {
        let start = Instant::now();
        tokio::time::timeout(timeout, sqlx::query("SELECT 1").execute(self.pool()))
            .await
            .map_err(|_| ConnectionError::Timeout(timeout))?
            .map_err(ConnectionError::Connect)?;

        let latency = start.elapsed();
        debug!(latency_ms = latency.as_millis() as u64, "PostgreSQL ping");
        Ok(latency)
    }

    /// 获取连接池状态
    pub fn pool_status(&self) -> PoolStatus {
        let size = self.pool().size();
        let idle = self.pool().num_idle() as u32;
        PoolStatus {
            size,
            idle,
            active: size.saturating_sub(idle),
        }
    }
}
