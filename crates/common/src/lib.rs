//! mesh-common - 服务间共享的工具
//!
//! 重试只用于单个业务操作内部，启动流程不重试

pub mod retry;

pub use retry::*;
