//! # HTTP Front Door
//!
//! A deliberately small HTTP surface that runs alongside the maintainer:
//! `/` answers with a static greeting and `/status` exposes the loop
//! counters as JSON. Handlers only ever read the shared state; all writes to
//! the configuration namespace belong to the maintainer cycle.

use std::sync::Arc;

use serde::Serialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::ConfigStore;
use crate::maintainer::{MaintainerStatus, StatusHandle};

/// Body served on `/`.
pub const GREETING: &str = "Hello World!";

#[derive(Debug, Serialize)]
struct StatusBody<'a> {
    #[serde(flatten)]
    maintainer: &'a MaintainerStatus,
    /// Entries currently in the configuration namespace.
    parameters: usize,
}

/// Render the `/status` payload.
pub fn status_json(status: &MaintainerStatus, parameters: usize) -> String {
    serde_json::to_string(&StatusBody {
        maintainer: status,
        parameters,
    })
    .unwrap_or_else(|_| "{}".to_string())
}

/// Bind and serve until the shutdown signal fires.
pub async fn serve(
    host: &str,
    port: u16,
    namespace: ConfigStore,
    status: StatusHandle,
    shutdown: watch::Receiver<bool>,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(format!("{host}:{port}")).await?;
    info!(host, port, "front door listening");
    serve_on(listener, namespace, status, shutdown).await
}

/// Accept loop over an already-bound listener. Split out so tests can bind
/// an ephemeral port themselves.
pub async fn serve_on(
    listener: TcpListener,
    namespace: ConfigStore,
    status: StatusHandle,
    mut shutdown: watch::Receiver<bool>,
) -> std::io::Result<()> {
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, _addr) = accepted?;
                let namespace = namespace.clone();
                let status = Arc::clone(&status);
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, namespace, status).await {
                        warn!(error = %e, "connection error");
                    }
                });
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("front door stopping");
                    return Ok(());
                }
            }
        }
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    namespace: ConfigStore,
    status: StatusHandle,
) -> std::io::Result<()> {
    let mut buf = vec![0u8; 4096];
    let n = stream.read(&mut buf).await?;
    let request = String::from_utf8_lossy(&buf[..n]);

    // Request line: "GET /path HTTP/1.1"
    let first_line = request.lines().next().unwrap_or("");
    let parts: Vec<&str> = first_line.split_whitespace().collect();
    if parts.len() < 2 {
        return Ok(());
    }
    let path = parts[1].split('?').next().unwrap_or(parts[1]);

    let response = match path {
        "/" => http_response("200 OK", "text/plain; charset=utf-8", GREETING),
        "/status" => {
            let snapshot = status
                .lock()
                .map(|s| s.clone())
                .unwrap_or_default();
            let body = status_json(&snapshot, namespace.len());
            http_response("200 OK", "application/json", &body)
        }
        _ => http_response("404 Not Found", "text/plain; charset=utf-8", "not found"),
    };

    stream.write_all(response.as_bytes()).await
}

fn http_response(status_line: &str, content_type: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_line,
        content_type,
        body.len(),
        body,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    fn make_status(cycles: u64) -> StatusHandle {
        Arc::new(Mutex::new(MaintainerStatus {
            cycles_completed: cycles,
            rows_applied: 4,
            connect_failures: 0,
            running: true,
            last_error: None,
        }))
    }

    async fn request(addr: std::net::SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.expect("connect");
        stream
            .write_all(format!("GET {path} HTTP/1.1\r\nHost: localhost\r\n\r\n").as_bytes())
            .await
            .expect("write request");
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.expect("read response");
        String::from_utf8_lossy(&response).to_string()
    }

    #[test]
    fn test_status_json_shape() {
        let status = MaintainerStatus {
            cycles_completed: 3,
            rows_applied: 12,
            connect_failures: 1,
            running: true,
            last_error: None,
        };
        let json = status_json(&status, 7);
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["cycles_completed"], 3);
        assert_eq!(v["rows_applied"], 12);
        assert_eq!(v["connect_failures"], 1);
        assert_eq!(v["running"], true);
        assert_eq!(v["parameters"], 7);
    }

    #[test]
    fn test_http_response_formatting() {
        let response = http_response("200 OK", "text/plain; charset=utf-8", "hi");
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("Content-Length: 2\r\n"));
        assert!(response.ends_with("\r\n\r\nhi"));
    }

    #[tokio::test]
    async fn test_root_serves_greeting() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let (_tx, rx) = watch::channel(false);
        tokio::spawn(serve_on(listener, ConfigStore::new(), make_status(0), rx));

        let response = request(addr, "/").await;

        assert!(response.starts_with("HTTP/1.1 200 OK"), "response: {response}");
        assert!(response.ends_with(GREETING), "response: {response}");
    }

    #[tokio::test]
    async fn test_status_endpoint_reflects_counters() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let namespace = ConfigStore::new();
        namespace.set("A", "1");
        namespace.set("B", "2");
        let (_tx, rx) = watch::channel(false);
        tokio::spawn(serve_on(listener, namespace, make_status(9), rx));

        let response = request(addr, "/status").await;
        let body = response.split("\r\n\r\n").nth(1).expect("body");
        let v: serde_json::Value = serde_json::from_str(body).expect("json body");

        assert_eq!(v["cycles_completed"], 9);
        assert_eq!(v["parameters"], 2);
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let (_tx, rx) = watch::channel(false);
        tokio::spawn(serve_on(listener, ConfigStore::new(), make_status(0), rx));

        let response = request(addr, "/nope").await;

        assert!(response.starts_with("HTTP/1.1 404"), "response: {response}");
    }

    #[tokio::test]
    async fn test_serve_stops_on_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(serve_on(listener, ConfigStore::new(), make_status(0), rx));

        tx.send(true).expect("receiver alive");

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("server should stop promptly")
            .expect("server task should not panic")
            .expect("clean exit");
    }
}
