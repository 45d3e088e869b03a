//! gRPC service implementation

use std::sync::Arc;

use mesh_bootstrap::CallerInfo;
use tonic::{Request, Response, Status};
use tracing::debug;

use crate::application::{CategoryService, TaskService};
use crate::category::v1::category_service_server::CategoryService as CategoryApi;
use crate::category::v1::*;

/// `category.v1.CategoryService` 的实现，分类与任务共用一个接口
pub struct CategoryGrpcService {
    categories: Arc<CategoryService>,
    tasks: Arc<TaskService>,
}

impl CategoryGrpcService {
    pub fn new(categories: Arc<CategoryService>, tasks: Arc<TaskService>) -> Self {
        Self { categories, tasks }
    }
}

fn log_caller<T>(method: &'static str, request: &Request<T>) {
    let caller = CallerInfo::from_metadata(request.metadata());
    debug!(
        method,
        caller_service = %caller.service,
        caller_version = %caller.version,
        "Incoming call"
    );
}

#[tonic::async_trait]
impl CategoryApi for CategoryGrpcService {
    async fn create_category(
        &self,
        request: Request<CreateCategoryRequest>,
    ) -> Result<Response<CreateCategoryResponse>, Status> {
        log_caller("CreateCategory", &request);
        let req = request.into_inner();

        let category = self.categories.create_category(&req.name).await?;
        Ok(Response::new(CreateCategoryResponse {
            category: Some(category.into()),
        }))
    }

    async fn get_category_by_id(
        &self,
        request: Request<GetCategoryByIdRequest>,
    ) -> Result<Response<GetCategoryByIdResponse>, Status> {
        log_caller("GetCategoryById", &request);
        let req = request.into_inner();

        let category = self.categories.get_category(req.id).await?;
        Ok(Response::new(GetCategoryByIdResponse {
            category: Some(category.into()),
        }))
    }

    async fn list_categories(
        &self,
        request: Request<ListCategoriesRequest>,
    ) -> Result<Response<ListCategoriesResponse>, Status> {
        log_caller("ListCategories", &request);
        let req = request.into_inner();

        let categories = self.categories.list_categories(&req.ids).await?;
        Ok(Response::new(ListCategoriesResponse {
            categories: categories.into_iter().map(Into::into).collect(),
        }))
    }

    async fn create_task(
        &self,
        request: Request<CreateTaskRequest>,
    ) -> Result<Response<CreateTaskResponse>, Status> {
        log_caller("CreateTask", &request);
        let req = request.into_inner();

        let task = self
            .tasks
            .create_task(req.category_id, &req.description)
            .await?;
        Ok(Response::new(CreateTaskResponse {
            task: Some(task.into()),
        }))
    }

    async fn list_tasks(
        &self,
        request: Request<ListTasksRequest>,
    ) -> Result<Response<ListTasksResponse>, Status> {
        log_caller("ListTasks", &request);
        let req = request.into_inner();

        let tasks = self.tasks.list_tasks(req.category_id).await?;
        Ok(Response::new(ListTasksResponse {
            tasks: tasks.into_iter().map(Into::into).collect(),
        }))
    }

    async fn complete_task(
        &self,
        request: Request<CompleteTaskRequest>,
    ) -> Result<Response<CompleteTaskResponse>, Status> {
        log_caller("CompleteTask", &request);
        let req = request.into_inner();

        let task = self.tasks.complete_task(req.task_id).await?;
        Ok(Response::new(CompleteTaskResponse {
            task: Some(task.into()),
        }))
    }
}
