//! mesh-adapter-postgres - PostgreSQL 适配器

mod config;
mod connection;
mod health;
mod migration;

pub use config::*;
pub use connection::*;
pub use health::*;

pub use sqlx::migrate::Migrator;
pub use sqlx::PgPool;
