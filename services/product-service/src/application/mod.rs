//! 应用层

mod product_service;

pub use product_service::*;
