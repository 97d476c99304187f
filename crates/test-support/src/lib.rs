use anyhow::Context as _;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

/// An axum router served on an ephemeral localhost port for the lifetime of the value.
///
/// Dropping the server triggers a graceful shutdown; in-flight requests are allowed to finish.
pub struct TestServer {
    base_url: String,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    /// Bind `127.0.0.1:0` and start serving `router` on the current runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the ephemeral port fails or its address cannot be read.
    pub async fn start(router: axum::Router) -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind ephemeral port")?;
        let addr = listener.local_addr().context("read local addr")?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = axum::serve(listener, router).with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        });
        tokio::spawn(async move {
            let _ = server.await;
        });

        Ok(Self {
            base_url: format!("http://{addr}"),
            shutdown: Some(shutdown_tx),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for `path` (which must start with `/`).
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Answer one request with `status` and a body shorter than its declared `content-length`.
///
/// The client sees the status line, then fails while reading the body. Returns the base URL.
///
/// # Errors
///
/// Returns an error if binding the ephemeral port fails.
pub async fn serve_truncated_body(status: u16) -> anyhow::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .context("bind ephemeral port")?;
    let addr = listener.local_addr().context("read local addr")?;
    tokio::spawn(async move {
        let Ok((mut stream, _)) = listener.accept().await else {
            return;
        };
        if read_request(&mut stream).await.is_err() {
            return;
        }
        let head = format!(
            "HTTP/1.1 {status} Error\r\n\
             content-type: text/plain\r\n\
             content-length: 64\r\n\
             connection: close\r\n\r\npartial"
        );
        let _ = stream.write_all(head.as_bytes()).await;
        let _ = stream.shutdown().await;
    });
    Ok(format!("http://{addr}"))
}

/// Consume one request (headers plus `content-length` bytes of body).
async fn read_request(stream: &mut TcpStream) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0_u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
        let body_len = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if buf.len() >= end + 4 + body_len {
            return Ok(());
        }
    }
}

/// Write `value` as pretty JSON to `dir/name` and return the path.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_json(dir: &Path, name: &str, value: &serde_json::Value) -> anyhow::Result<PathBuf> {
    let path = dir.join(name);
    let bytes = serde_json::to_vec_pretty(value).context("serialize json")?;
    std::fs::write(&path, bytes).with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}

/// A configuration artifact pointing at `gateway_url` and `token_endpoint`.
#[must_use]
pub fn sample_gateway_config(gateway_url: &str, token_endpoint: &str) -> serde_json::Value {
    serde_json::json!({
        "gateway_url": gateway_url,
        "gateway_id": "testgateway-abc123",
        "region": "us-east-1",
        "client_info": {
            "client_id": "client-1",
            "client_secret": "secret-1",
            "user_pool_id": "us-east-1_TestPool",
            "token_endpoint": token_endpoint,
            "scope": "TestGateway/invoke",
            "domain_prefix": "agentcore-abc123"
        }
    })
}
