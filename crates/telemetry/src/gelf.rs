//! GELF 1.1 over UDP
//!
//! 单个数据报放不下的消息按 GELF 分块协议拆分；超过 128 块的消息直接丢弃。

use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use rand::rngs::StdRng;
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::TelemetryError;

const CHUNK_MAGIC: [u8; 2] = [0x1e, 0x0f];
const CHUNK_HEADER_LEN: usize = 12;
const MAX_DATAGRAM: usize = 8192;
const MAX_CHUNKS: usize = 128;

/// tracing 级别到 syslog 级别
pub fn syslog_level(level: &Level) -> u8 {
    match *level {
        Level::ERROR => 3,
        Level::WARN => 4,
        Level::INFO => 6,
        Level::DEBUG | Level::TRACE => 7,
    }
}

/// 把一条消息拆成 GELF 数据报
///
/// 放得进单个数据报时原样返回；超过块数上限返回 None
pub fn chunk_payload(payload: &[u8], message_id: [u8; 8]) -> Option<Vec<Vec<u8>>> {
    if payload.len() <= MAX_DATAGRAM {
        return Some(vec![payload.to_vec()]);
    }

    let body = MAX_DATAGRAM - CHUNK_HEADER_LEN;
    let count = payload.len().div_ceil(body);
    if count > MAX_CHUNKS {
        return None;
    }

    let chunks = payload
        .chunks(body)
        .enumerate()
        .map(|(seq, part)| {
            let mut datagram = Vec::with_capacity(CHUNK_HEADER_LEN + part.len());
            datagram.extend_from_slice(&CHUNK_MAGIC);
            datagram.extend_from_slice(&message_id);
            datagram.push(seq as u8);
            datagram.push(count as u8);
            datagram.extend_from_slice(part);
            datagram
        })
        .collect();
    Some(chunks)
}

/// GELF 发送端
pub struct GelfSink {
    socket: UdpSocket,
    target: SocketAddr,
    host: String,
    service: String,
    rng: Mutex<StdRng>,
    dropped: AtomicU64,
    closed: AtomicBool,
}

impl GelfSink {
    pub fn connect(addr: &str, service: &str, rng: StdRng) -> Result<Self, TelemetryError> {
        let sink_error = |reason: String| TelemetryError::Sink {
            addr: addr.to_string(),
            reason,
        };

        let target = addr
            .to_socket_addrs()
            .map_err(|e| sink_error(e.to_string()))?
            .next()
            .ok_or_else(|| sink_error("address resolved to nothing".to_string()))?;

        let bind_addr: SocketAddr = if target.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        let socket = UdpSocket::bind(bind_addr).map_err(|e| sink_error(e.to_string()))?;
        socket
            .set_nonblocking(true)
            .map_err(|e| sink_error(e.to_string()))?;

        let host = std::env::var("HOSTNAME").unwrap_or_else(|_| service.to_string());

        Ok(Self {
            socket,
            target,
            host,
            service: service.to_string(),
            rng: Mutex::new(rng),
            dropped: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        })
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// 关闭后不再发送
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn message_id(&self) -> [u8; 8] {
        match self.rng.lock() {
            Ok(mut rng) => rng.r#gen(),
            Err(poisoned) => poisoned.into_inner().r#gen(),
        }
    }

    fn encode(&self, level: &Level, target: &str, mut fields: Map<String, Value>) -> Value {
        let short_message = match fields.remove("message") {
            Some(Value::String(msg)) => msg,
            Some(other) => other.to_string(),
            None => String::new(),
        };
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();

        let mut message = Map::new();
        message.insert("version".into(), Value::from("1.1"));
        message.insert("host".into(), Value::from(self.host.clone()));
        message.insert("short_message".into(), Value::from(short_message));
        message.insert("timestamp".into(), Value::from(timestamp));
        message.insert("level".into(), Value::from(syslog_level(level)));
        message.insert("_service".into(), Value::from(self.service.clone()));
        message.insert("_target".into(), Value::from(target));
        for (key, value) in fields {
            // GELF 保留 `_id`
            if key == "id" {
                message.insert("_field_id".into(), value);
            } else {
                message.insert(format!("_{key}"), value);
            }
        }
        Value::Object(message)
    }

    fn send(&self, message: &Value) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        let payload = match serde_json::to_vec(message) {
            Ok(payload) => payload,
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return;
            }
        };

        let Some(datagrams) = chunk_payload(&payload, self.message_id()) else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        };
        for datagram in datagrams {
            if self.socket.send_to(&datagram, self.target).is_err() {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return;
            }
        }
    }
}

/// 把 tracing 事件转发到 GELF 的 Layer
pub struct GelfLayer {
    sink: Arc<GelfSink>,
}

impl GelfLayer {
    pub fn new(sink: Arc<GelfSink>) -> Self {
        Self { sink }
    }
}

impl<S: Subscriber> Layer<S> for GelfLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = JsonVisitor::default();
        event.record(&mut visitor);

        let metadata = event.metadata();
        let message = self
            .sink
            .encode(metadata.level(), metadata.target(), visitor.fields);
        self.sink.send(&message);
    }
}

#[derive(Default)]
struct JsonVisitor {
    fields: Map<String, Value>,
}

impl Visit for JsonVisitor {
    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().into(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().into(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().into(), Value::from(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.fields.insert(field.name().into(), Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.fields
            .insert(field.name().into(), Value::from(format!("{value:?}")));
    }
}
