//! Plain HTTP liveness endpoint.
//!
//! Answers `GET /health` with `200 {"status":"ok"}` and everything else
//! with 404. One request per connection.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, info};

/// Serves health checks on `listener` until accepting fails.
pub async fn serve(listener: TcpListener) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Health endpoint listening on http://{}/health", addr);
    }

    loop {
        let (mut socket, peer) = listener.accept().await?;

        tokio::spawn(async move {
            let mut buffer = [0u8; 1024];

            match socket.read(&mut buffer).await {
                Ok(n) if n > 0 => {
                    let request = String::from_utf8_lossy(&buffer[..n]);
                    let response = respond(&request);
                    if let Err(e) = socket.write_all(response.as_bytes()).await {
                        debug!("Failed to write health response to {}: {}", peer, e);
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    debug!("Failed to read from health socket {}: {}", peer, e);
                }
            }
        });
    }
}

/// Builds the full HTTP response for a raw request.
fn respond(request: &str) -> String {
    let mut request_line = request.lines().next().unwrap_or("").split_whitespace();
    let method = request_line.next().unwrap_or("");
    let target = request_line.next().unwrap_or("");
    let path = target.split('?').next().unwrap_or("");

    if method == "GET" && path == "/health" {
        let body = serde_json::json!({ "status": "ok" }).to_string();
        format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        )
    } else {
        "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string()
    }
}
