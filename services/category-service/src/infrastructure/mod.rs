//! 基础设施层

mod postgres;
mod rows;

pub use postgres::*;
