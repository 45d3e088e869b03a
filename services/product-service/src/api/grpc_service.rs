//! gRPC service implementation

use std::sync::Arc;

use mesh_bootstrap::CallContext;
use tonic::{Request, Response, Status};
use tracing::debug;

use crate::application::ProductService;
use crate::product::v1::product_service_server::ProductService as ProductApi;
use crate::product::v1::*;

/// `product.v1.ProductService` 的实现
pub struct ProductGrpcService {
    products: Arc<ProductService>,
}

impl ProductGrpcService {
    pub fn new(products: Arc<ProductService>) -> Self {
        Self { products }
    }
}

/// 捕获入站截止时间与调用方身份
fn call_context<T>(method: &'static str, request: &Request<T>) -> CallContext {
    let ctx = CallContext::from_request(request);
    debug!(
        method,
        caller_service = %ctx.caller().service,
        remaining_ms = ctx.remaining().map(|d| d.as_millis() as u64),
        "Incoming call"
    );
    ctx
}

#[tonic::async_trait]
impl ProductApi for ProductGrpcService {
    async fn create_product(
        &self,
        request: Request<CreateProductRequest>,
    ) -> Result<Response<CreateProductResponse>, Status> {
        let ctx = call_context("CreateProduct", &request);
        let req = request.into_inner();

        let details = self
            .products
            .create_product(&ctx, &req.name, req.category_id)
            .await?;
        Ok(Response::new(CreateProductResponse {
            product: Some(details.into()),
        }))
    }

    async fn get_product(
        &self,
        request: Request<GetProductRequest>,
    ) -> Result<Response<GetProductResponse>, Status> {
        let ctx = call_context("GetProduct", &request);
        let req = request.into_inner();

        let details = self.products.get_product(&ctx, req.id).await?;
        Ok(Response::new(GetProductResponse {
            product: Some(details.into()),
        }))
    }

    async fn list_products(
        &self,
        request: Request<ListProductsRequest>,
    ) -> Result<Response<ListProductsResponse>, Status> {
        let ctx = call_context("ListProducts", &request);
        let req = request.into_inner();

        let products = self.products.list_products(&ctx, req.category_id).await?;
        Ok(Response::new(ListProductsResponse {
            products: products.into_iter().map(Into::into).collect(),
        }))
    }
}
