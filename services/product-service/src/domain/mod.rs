//! 领域层

pub mod catalog;
pub mod entities;
pub mod repositories;

pub use catalog::*;
pub use entities::*;
pub use repositories::*;
