//! category-service - 分类与任务服务

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;

// 引入生成的 proto 代码
pub mod category {
    pub mod v1 {
        tonic::include_proto!("category.v1");
    }
}

use std::sync::Arc;

use mesh_adapter_postgres::Migrator;
use mesh_bootstrap::{GrpcServer, Infrastructure};
use mesh_config::GrpcConfig;
use mesh_errors::AppError;
use tracing::info;

use api::CategoryGrpcService;
use application::{CategoryService, TaskService};
use category::v1::category_service_server::CategoryServiceServer;
use domain::{CategoryRepository, TaskRepository};
use infrastructure::{PostgresCategoryRepository, PostgresTaskRepository};

pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("category_descriptor");

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// 由仓储组装 gRPC 服务器
pub fn compose(
    grpc: &GrpcConfig,
    categories: Arc<dyn CategoryRepository>,
    tasks: Arc<dyn TaskRepository>,
) -> Result<GrpcServer, AppError> {
    let category_service = Arc::new(CategoryService::new(categories.clone()));
    let task_service = Arc::new(TaskService::new(tasks, categories));
    let service = CategoryGrpcService::new(category_service, task_service);

    GrpcServer::new(grpc)
        .add_service(CategoryServiceServer::new(service))
        .with_reflection(&[FILE_DESCRIPTOR_SET])
}

/// 使用共享的基础设施组装服务
pub fn build_server(infra: &Infrastructure) -> Result<GrpcServer, AppError> {
    info!("Initializing category service...");

    let pool = infra.pool();
    let categories = Arc::new(PostgresCategoryRepository::new(pool.clone()));
    let tasks = Arc::new(PostgresTaskRepository::new(pool));
    info!("Repositories initialized");

    compose(&infra.config().grpc, categories, tasks)
}
