//! 调用上下文
//!
//! 捕获入站请求的截止时间，出站调用只使用剩余时间；
//! 入站 handler 被取消时，正在进行的下游调用随 future 一起被丢弃。

use std::time::{Duration, Instant};

use tonic::{Request, Status};

use crate::interceptor::CallerInfo;

const GRPC_TIMEOUT_HEADER: &str = "grpc-timeout";

/// 解析 `grpc-timeout` 头（1-8 位数字 + 单位）
pub fn parse_grpc_timeout(value: &str) -> Option<Duration> {
    if value.len() < 2 || !value.is_ascii() {
        return None;
    }
    let (digits, unit) = value.split_at(value.len() - 1);
    if digits.len() > 8 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let amount: u64 = digits.parse().ok()?;

    let duration = match unit {
        "H" => Duration::from_secs(amount * 60 * 60),
        "M" => Duration::from_secs(amount * 60),
        "S" => Duration::from_secs(amount),
        "m" => Duration::from_millis(amount),
        "u" => Duration::from_micros(amount),
        "n" => Duration::from_nanos(amount),
        _ => return None,
    };
    Some(duration)
}

#[derive(Debug, Clone)]
pub struct CallContext {
    deadline: Option<Instant>,
    caller: CallerInfo,
}

impl CallContext {
    pub fn from_request<T>(request: &Request<T>) -> Self {
        let deadline = request
            .metadata()
            .get(GRPC_TIMEOUT_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_grpc_timeout)
            .map(|timeout| Instant::now() + timeout);

        Self {
            deadline,
            caller: CallerInfo::from_metadata(request.metadata()),
        }
    }

    /// 没有入站请求时使用（后台任务、测试）
    pub fn detached() -> Self {
        Self {
            deadline: None,
            caller: CallerInfo::from_metadata(&Default::default()),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    pub fn caller(&self) -> &CallerInfo {
        &self.caller
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// 构造下游请求；截止时间已过则不发送
    #[allow(clippy::result_large_err)]
    pub fn outgoing<M>(&self, message: M) -> Result<Request<M>, Status> {
        let mut request = Request::new(message);
        if let Some(remaining) = self.remaining() {
            if remaining.is_zero() {
                return Err(Status::deadline_exceeded(
                    "Deadline elapsed before downstream call",
                ));
            }
            request.set_timeout(remaining);
        }
        Ok(request)
    }
}
