//! Shared utilities for integration tests.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use axum::http::StatusCode;
use ocm_gateway::config::{Credentials, GatewayConfig};
use ocm_gateway::http::HttpServer;
use ocm_gateway::lifecycle::Shutdown;

/// What a mock backend does with one connection.
#[allow(dead_code)]
pub enum Reply {
    /// Answer with status and JSON body.
    Respond(u16, String),
    /// Close the socket without answering.
    Drop,
    /// Read the request and never answer.
    Hang,
    /// Read the request, never answer, and report when the peer closes.
    HangUntilClosed(mpsc::UnboundedSender<()>),
}

/// A running mock upstream.
#[allow(dead_code)]
pub struct MockBackend {
    pub addr: SocketAddr,
    /// Connections accepted so far (one per upstream attempt).
    pub hits: Arc<AtomicU32>,
    /// Raw text of every request that was read.
    pub requests: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl MockBackend {
    pub fn hits(&self) -> u32 {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

/// Start a programmable mock backend.
///
/// `f` receives the zero-based connection index and the raw request text
/// (empty for `Reply::Drop`, which is decided before reading).
pub async fn start_programmable_backend<F, Fut>(f: F) -> MockBackend
where
    F: Fn(u32, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Reply> + Send + 'static,
{
    start_backend(f, false).await
}

/// Like `start_programmable_backend`, but the request is read before `f` runs.
pub async fn start_recording_backend<F, Fut>(f: F) -> MockBackend
where
    F: Fn(u32, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Reply> + Send + 'static,
{
    start_backend(f, true).await
}

async fn start_backend<F, Fut>(f: F, read_first: bool) -> MockBackend
where
    F: Fn(u32, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Reply> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicU32::new(0));
    let requests = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    let backend = MockBackend {
        addr,
        hits: hits.clone(),
        requests: requests.clone(),
    };

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let index = hits.fetch_add(1, Ordering::SeqCst);
                    let f = f.clone();
                    let requests = requests.clone();
                    tokio::spawn(async move {
                        let text = if read_first {
                            let text = read_request(&mut socket).await.unwrap_or_default();
                            requests.lock().unwrap().push(text.clone());
                            text
                        } else {
                            String::new()
                        };

                        match f(index, text).await {
                            Reply::Drop => drop(socket),
                            Reply::Hang => {
                                if !read_first {
                                    let _ = read_request(&mut socket).await;
                                }
                                tokio::time::sleep(Duration::from_secs(60)).await;
                            }
                            Reply::HangUntilClosed(closed) => {
                                if !read_first {
                                    let _ = read_request(&mut socket).await;
                                }
                                let mut buf = [0u8; 1024];
                                let eof = async {
                                    loop {
                                        match socket.read(&mut buf).await {
                                            Ok(0) | Err(_) => break,
                                            Ok(_) => continue,
                                        }
                                    }
                                };
                                if tokio::time::timeout(Duration::from_secs(60), eof).await.is_ok() {
                                    let _ = closed.send(());
                                }
                            }
                            Reply::Respond(status, body) => {
                                if !read_first {
                                    if let Some(text) = read_request(&mut socket).await {
                                        requests.lock().unwrap().push(text);
                                    }
                                }
                                write_response(&mut socket, status, &body).await;
                            }
                        }
                    });
                }
                Err(_) => break,
            }
        }
    });

    backend
}

/// Start a backend that always answers `status` with `body`.
#[allow(dead_code)]
pub async fn start_mock_backend(status: u16, body: &'static str) -> MockBackend {
    start_recording_backend(move |_, _| async move { Reply::Respond(status, body.to_string()) })
        .await
}

/// An address that refuses connections.
#[allow(dead_code)]
pub fn closed_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

async fn read_request(socket: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let content_length = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    Some(String::from_utf8_lossy(&buf).to_string())
}

async fn write_response(socket: &mut TcpStream, status: u16, body: &str) {
    let reason = StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown");
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nX-Upstream: mock\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// Gateway config pointing at `base_url` with short timeouts for tests.
#[allow(dead_code)]
pub fn gateway_config(base_url: &str) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.host = "127.0.0.1".into();
    config.upstream.base_url = base_url.to_string();
    config.upstream.system_proxy = false;
    config.upstream.credentials = Some(Credentials {
        username: "sub-42/api-user".into(),
        password: "secret".into(),
    });
    config.timeouts.connect_secs = 1;
    config.timeouts.upstream_secs = 1;
    config.timeouts.request_secs = 10;
    config.retries.max_retries = 1;
    config.retries.base_delay_ms = 10;
    config.retries.max_delay_ms = 50;
    config
}

/// Start the gateway on an ephemeral port.
#[allow(dead_code)]
pub async fn spawn_gateway(config: GatewayConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// Test client that bypasses any system proxy.
#[allow(dead_code)]
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
