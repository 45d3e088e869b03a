//! 启动失败日志必须送达远程日志端
//!
//! 独立的测试进程：全局 subscriber 只能安装一次

use std::io::Write;
use std::net::UdpSocket;
use std::time::{Duration, Instant};

use mesh_bootstrap::{Bootstrap, BootstrapError};
use serde_json::Value;

#[tokio::test]
async fn fatal_startup_error_reaches_gelf_sink() {
    let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
    receiver
        .set_read_timeout(Some(Duration::from_millis(200)))
        .unwrap();
    let graylog = receiver.local_addr().unwrap();

    // 接受连接但从不应答的"数据库"
    let silent = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let db = silent.local_addr().unwrap();

    let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
    write!(
        file,
        r#"
project:
  name: mesh
  service_name: product
  version: 0.1.0
grpc:
  host: 127.0.0.1
  port: 0
database:
  dsn: "postgres://u:p@{db}/db"
  connect_timeout_secs: 1
telemetry:
  log_level: info
  graylog_addr: "{graylog}"
"#
    )
    .unwrap();

    let result = Bootstrap::new(file.path())
        .run(
            |_| Err(mesh_errors::AppError::internal("unreachable")),
            std::future::ready(()),
        )
        .await;
    assert!(matches!(result, Err(BootstrapError::Connection(_))));

    let deadline = Instant::now() + Duration::from_secs(5);
    let mut buf = vec![0u8; 65536];
    loop {
        assert!(
            Instant::now() < deadline,
            "fatal bootstrap error never reached the remote sink"
        );
        let Ok((len, _)) = receiver.recv_from(&mut buf) else {
            continue;
        };
        let Ok(message) = serde_json::from_slice::<Value>(&buf[..len]) else {
            continue;
        };
        if message["short_message"] == "Bootstrap failed" {
            assert_eq!(message["_stage"], "provision");
            assert_eq!(message["_service"], "product");
            break;
        }
    }
}
