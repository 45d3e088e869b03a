//! 基础设施资源管理
//!
//! 每个进程只有一份：数据库句柄与各下游服务的客户端通道，
//! 所有领域服务共享，不自行建立连接。

use std::collections::BTreeMap;
use std::sync::Arc;

use mesh_adapter_postgres::{
    ConnectionError, Database, Migrator, PgPool, PostgresConfig, PoolStatus, SslMode,
};
use mesh_config::{AppConfig, DatabaseConfig, DownstreamConfig, TransportSecurity};
use mesh_errors::AppError;
use secrecy::ExposeSecret;
use tonic::codegen::InterceptedService;
use tonic::transport::{Certificate, Channel, ClientTlsConfig, Endpoint};
use tracing::{error, info};

use crate::error::{BootstrapError, DialError};
use crate::interceptor::{AppInfo, AppInfoInterceptor};

/// 附带身份拦截器的下游通道，交给生成的客户端使用
pub type InterceptedChannel = InterceptedService<Channel, AppInfoInterceptor>;

/// 基础设施资源容器
pub struct Infrastructure {
    config: Arc<AppConfig>,
    database: Database,
    app_info: AppInfo,
    channels: BTreeMap<String, InterceptedChannel>,
}

impl Infrastructure {
    /// 打开数据库、执行迁移、创建下游通道
    ///
    /// 任一步失败时已打开的数据库会被关闭
    pub async fn provision(
        config: Arc<AppConfig>,
        downstream: &[String],
        migrator: Option<&Migrator>,
    ) -> Result<Self, BootstrapError> {
        let database = open_database(&config.database, &config.project.service_name).await?;

        match Self::finish(&config, &database, downstream, migrator).await {
            Ok((app_info, channels)) => Ok(Self {
                config,
                database,
                app_info,
                channels,
            }),
            Err(e) => {
                database.close().await;
                Err(e)
            }
        }
    }

    async fn finish(
        config: &AppConfig,
        database: &Database,
        downstream: &[String],
        migrator: Option<&Migrator>,
    ) -> Result<(AppInfo, BTreeMap<String, InterceptedChannel>), BootstrapError> {
        if config.database.run_migrations {
            if let Some(migrator) = migrator {
                database.migrate(migrator).await?;
            }
        }

        let app_info = AppInfo::from_project(&config.project);
        let interceptor = AppInfoInterceptor::new(&app_info)?;

        let mut channels = BTreeMap::new();
        for name in downstream {
            let cfg = config.downstream(name)?;
            let channel = dial_service(name, cfg, interceptor.clone())?;
            channels.insert(name.clone(), channel);
        }

        Ok((app_info, channels))
    }

    /// 获取应用配置
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    /// 获取 PostgreSQL 连接池
    pub fn pool(&self) -> PgPool {
        self.database.pool().clone()
    }

    pub fn app_info(&self) -> &AppInfo {
        &self.app_info
    }

    /// 获取已创建的下游通道
    pub fn downstream(&self, name: &str) -> Result<InterceptedChannel, AppError> {
        self.channels
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::internal(format!("Downstream `{name}` was not provisioned")))
    }

    /// 获取 PostgreSQL 连接池状态
    pub fn postgres_pool_status(&self) -> PoolStatus {
        self.database.pool_status()
    }

    /// 关闭数据库连接池
    pub async fn close(self) {
        self.database.close().await;
    }
}

/// 由配置构造 PostgreSQL 连接设置
pub fn postgres_config(
    db: &DatabaseConfig,
    application_name: &str,
) -> Result<PostgresConfig, ConnectionError> {
    let config = match (&db.dsn, &db.host, &db.user, &db.name) {
        (Some(dsn), _, _, _) => PostgresConfig::new(dsn.expose_secret().clone()),
        (None, Some(host), Some(user), Some(name)) => {
            let config = PostgresConfig::from_components(host, db.port, name, user);
            match &db.password {
                Some(password) => config.with_password(password.clone()),
                None => config,
            }
        }
        _ => {
            return Err(ConnectionError::InvalidDsn(
                "either `dsn` or `host`, `user` and `name` is required".to_string(),
            ));
        }
    };

    let mut config = config
        .with_pool(db.min_connections, db.max_connections)
        .with_connect_timeout(db.connect_timeout())
        .with_application_name(application_name);
    if let Some(mode) = &db.ssl_mode {
        config = config.with_ssl_mode(mode.parse::<SslMode>()?);
    }
    Ok(config)
}

/// 在初始化截止时间内打开数据库
pub async fn open_database(
    db: &DatabaseConfig,
    application_name: &str,
) -> Result<Database, ConnectionError> {
    let config = postgres_config(db, application_name)?;
    Database::open(&config).await.inspect_err(|e| {
        error!(error = %e, timeout_secs = db.connect_timeout_secs, "Failed to open database");
    })
}

/// 创建下游客户端通道
///
/// 连接延迟建立；每次调用都经过身份拦截器
pub fn dial_service(
    name: &str,
    cfg: &DownstreamConfig,
    interceptor: AppInfoInterceptor,
) -> Result<InterceptedChannel, DialError> {
    let uri = cfg.uri();
    let mut endpoint = Endpoint::from_shared(uri.clone())
        .map_err(|e| DialError::InvalidAddress {
            service: name.to_string(),
            reason: e.to_string(),
        })?
        .connect_timeout(cfg.connect_timeout())
        .timeout(cfg.request_timeout());

    if cfg.transport == TransportSecurity::Tls {
        endpoint = endpoint
            .tls_config(client_tls_config(name, cfg)?)
            .map_err(|e| DialError::Tls {
                service: name.to_string(),
                reason: e.to_string(),
            })?;
    }

    let channel = endpoint.connect_lazy();
    info!(
        downstream = name,
        uri = %uri,
        transport = ?cfg.transport,
        "Downstream channel created"
    );
    Ok(InterceptedService::new(channel, interceptor))
}

fn client_tls_config(name: &str, cfg: &DownstreamConfig) -> Result<ClientTlsConfig, DialError> {
    let mut tls = ClientTlsConfig::new().with_webpki_roots();
    if let Some(path) = &cfg.ca_cert_path {
        let pem = std::fs::read(path).map_err(|e| DialError::Tls {
            service: name.to_string(),
            reason: format!("cannot read CA certificate {}: {e}", path.display()),
        })?;
        tls = tls.ca_certificate(Certificate::from_pem(pem));
    }
    if let Some(domain) = &cfg.tls_domain {
        tls = tls.domain_name(domain.clone());
    }
    Ok(tls)
}
