use std::env;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);

    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .file_descriptor_set_path(out_dir.join("product_descriptor.bin"))
        .compile_protos(&["../../proto/product/v1/product.proto"], &["../../proto"])?;

    // 下游分类服务的客户端桩；服务端部分只供集成测试的替身使用
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&["../../proto/category/v1/category.proto"], &["../../proto"])?;

    Ok(())
}
