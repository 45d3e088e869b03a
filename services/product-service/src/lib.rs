//! product-service - 商品服务
//!
//! 分类信息来自 category-service，经由带身份拦截器的下游通道访问

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;

// 引入生成的 proto 代码
pub mod product {
    pub mod v1 {
        tonic::include_proto!("product.v1");
    }
}

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

use api::ProductGrpcService;
use application::ProductService;
use domain::{CategoryCatalog, ProductRepository};
use infrastructure::{CATEGORY_SERVICE, GrpcCategoryCatalog, PostgresProductRepository};
use product::v1::product_service_server::ProductServiceServer;

pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("product_descriptor");

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// 由仓储与分类目录组装 gRPC 服务器
pub fn compose(
    grpc: &GrpcConfig,
    products: Arc<dyn ProductRepository>,
    catalog: Arc<dyn CategoryCatalog>,
) -> Result<GrpcServer, AppError> {
    let service = ProductGrpcService::new(Arc::new(ProductService::new(products, catalog)));

    GrpcServer::new(grpc)
        .add_service(ProductServiceServer::new(service))
        .with_reflection(&[FILE_DESCRIPTOR_SET])
}

/// 使用共享的基础设施组装服务
pub fn build_server(infra: &Infrastructure) -> Result<GrpcServer, AppError> {
    info!("Initializing product service...");

    let products = Arc::new(PostgresProductRepository::new(infra.pool()));
    let catalog = Arc::new(GrpcCategoryCatalog::new(infra.downstream(CATEGORY_SERVICE)?));
    info!(downstream = CATEGORY_SERVICE, "Category catalog initialized");

    compose(&infra.config().grpc, products, catalog)
}
