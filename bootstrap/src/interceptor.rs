//! gRPC Interceptors
//!
//! 出站调用附加应用身份元数据；入站请求读取同一组键用于日志

use std::sync::Arc;

use mesh_config::ProjectConfig;
use tonic::metadata::{Ascii, MetadataMap, MetadataValue};
use tonic::service::Interceptor;
use tonic::{Request, Status};

use crate::error::DialError;

pub const APP_NAME_KEY: &str = "x-app-name";
pub const APP_SERVICE_KEY: &str = "x-app-service";
pub const APP_VERSION_KEY: &str = "x-app-version";
pub const APP_COMMIT_HASH_KEY: &str = "x-app-commit-hash";
pub const APP_ENVIRONMENT_KEY: &str = "x-app-environment";

/// 应用身份描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppInfo {
    pub name: String,
    pub service: String,
    pub version: String,
    pub commit_hash: String,
    pub environment: String,
}

impl AppInfo {
    pub fn from_project(project: &ProjectConfig) -> Self {
        Self {
            name: project.name.clone(),
            service: project.service_name.clone(),
            version: project.version.clone(),
            commit_hash: project.commit_hash.clone(),
            environment: project.environment.clone(),
        }
    }

    fn entries(&self) -> [(&'static str, &str); 5] {
        [
            (APP_NAME_KEY, &self.name),
            (APP_SERVICE_KEY, &self.service),
            (APP_VERSION_KEY, &self.version),
            (APP_COMMIT_HASH_KEY, &self.commit_hash),
            (APP_ENVIRONMENT_KEY, &self.environment),
        ]
    }
}

/// 出站身份拦截器
///
/// 元数据值在构造时校验一次，之后每次调用只做覆盖写入
#[derive(Debug, Clone)]
pub struct AppInfoInterceptor {
    headers: Arc<[(&'static str, MetadataValue<Ascii>)]>,
}

impl AppInfoInterceptor {
    pub fn new(info: &AppInfo) -> Result<Self, DialError> {
        let headers = info
            .entries()
            .into_iter()
            .map(|(key, value)| {
                MetadataValue::try_from(value)
                    .map(|value| (key, value))
                    .map_err(|_| DialError::InvalidMetadata {
                        key,
                        value: value.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            headers: headers.into(),
        })
    }
}

impl Interceptor for AppInfoInterceptor {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        let metadata = request.metadata_mut();
        for (key, value) in self.headers.iter() {
            metadata.insert(*key, value.clone());
        }
        Ok(request)
    }
}

/// 入站请求中的调用方身份
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerInfo {
    pub name: String,
    pub service: String,
    pub version: String,
    pub environment: String,
}

impl CallerInfo {
    pub fn from_metadata(metadata: &MetadataMap) -> Self {
        let read = |key: &str| {
            metadata
                .get(key)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown")
                .to_string()
        };

        Self {
            name: read(APP_NAME_KEY),
            service: read(APP_SERVICE_KEY),
            version: read(APP_VERSION_KEY),
            environment: read(APP_ENVIRONMENT_KEY),
        }
    }
}
