//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use kfserving_proxy::backend::{
    BackendError, BackendResult, ModelBackend, ModelStatus, PredictRequest, PredictResponse,
};
use kfserving_proxy::config::schema::LimitsConfig;
use kfserving_proxy::config::ListenerConfig;
use kfserving_proxy::http::{build_router, AppState};
use kfserving_proxy::lifecycle::{ServerInstance, ShutdownSignal};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// A request seen by the mock model server.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub request_line: String,
    pub body: String,
}

/// Start a mock model server that answers every request with `status` and `body`.
///
/// Returns its address and the log of requests it received.
pub async fn start_mock_backend(
    status: u16,
    body: &'static str,
) -> (SocketAddr, Arc<Mutex<Vec<CapturedRequest>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let log = log.clone();
                    tokio::spawn(async move {
                        if let Some(request) = read_request(&mut socket).await {
                            log.lock().unwrap().push(request);
                        }
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, seen)
}

/// Read one HTTP/1.1 request (head plus `Content-Length` body).
async fn read_request(socket: &mut TcpStream) -> Option<CapturedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < head_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    Some(CapturedRequest {
        request_line: head.lines().next().unwrap_or_default().to_string(),
        body: String::from_utf8_lossy(&buf[head_end..]).to_string(),
    })
}

/// A port on loopback that nothing listens on.
pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// In-process backend whose calls take `delay` before succeeding.
pub struct SlowBackend {
    pub delay: Duration,
}

#[async_trait]
impl ModelBackend for SlowBackend {
    async fn status(&self) -> BackendResult<ModelStatus> {
        tokio::time::sleep(self.delay).await;
        Ok(ModelStatus {
            name: "slow".into(),
            ready: true,
        })
    }

    async fn predict(&self, _request: PredictRequest) -> BackendResult<PredictResponse> {
        tokio::time::sleep(self.delay).await;
        Err(BackendError::Status {
            status: 501,
            body: "predict not supported".into(),
        })
    }
}

/// A started proxy instance with its shutdown latch.
pub struct RunningProxy {
    pub server: ServerInstance,
    pub signal: ShutdownSignal,
    pub addr: SocketAddr,
}

impl RunningProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start a proxy on an ephemeral loopback port in front of `backend`.
pub async fn start_proxy(backend: Arc<dyn ModelBackend>) -> RunningProxy {
    let signal = ShutdownSignal::new();
    let app = build_router(
        AppState::new(backend, signal.clone()),
        &LimitsConfig::default(),
    );

    let mut server = ServerInstance::new();
    let config = ListenerConfig {
        host: "127.0.0.1".into(),
        port: "0".into(),
    };
    let addr = server.start(&config, app).await.unwrap();

    RunningProxy {
        server,
        signal,
        addr,
    }
}

/// HTTP client that never reuses or proxies connections.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
