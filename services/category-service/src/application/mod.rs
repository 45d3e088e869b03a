//! 应用层

mod category_service;
mod task_service;

pub use category_service::*;
pub use task_service::*;
