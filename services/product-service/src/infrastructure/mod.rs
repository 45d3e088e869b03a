//! 基础设施层

mod category_client;
mod postgres;
mod rows;

pub use category_client::*;
pub use postgres::*;
