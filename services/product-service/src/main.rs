//! product-service 入口

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use mesh_bootstrap::{Bootstrap, shutdown_signal};
use product_service::infrastructure::CATEGORY_SERVICE;

#[derive(Debug, Parser)]
#[command(name = "product-service", version, about = "Product gRPC service")]
struct Args {
    /// 配置文件路径
    #[arg(short, long, env = "MESH_CONFIG", default_value = mesh_config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let result = Bootstrap::new(&args.config)
        .with_downstream(CATEGORY_SERVICE)
        .with_migrator(&product_service::MIGRATOR)
        .run(product_service::build_server, shutdown_signal())
        .await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
