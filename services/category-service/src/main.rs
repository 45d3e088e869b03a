//! category-service 入口

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use mesh_bootstrap::{Bootstrap, shutdown_signal};

#[derive(Debug, Parser)]
#[command(name = "category-service", version, about = "Category and task gRPC service")]
struct Args {
    /// 配置文件路径
    #[arg(short, long, env = "MESH_CONFIG", default_value = mesh_config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let result = Bootstrap::new(&args.config)
        .with_migrator(&category_service::MIGRATOR)
        .run(category_service::build_server, shutdown_signal())
        .await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
