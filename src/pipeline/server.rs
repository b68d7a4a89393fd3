//! Static file server and reachability probe.
//!
//! The server is a plain axum router whose fallback is a tower-http
//! [`ServeDir`]: every request path maps onto a file below the root, with no
//! authentication and no TLS. Requests are traced at DEBUG level.
//!
//! The render stage never depends on *this* server specifically; it only
//! needs something answering at `http://<host>:<port>/`. [`probe`] checks
//! exactly that before a pass touches any file.

use crate::error::Html2PdfError;
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

/// Router serving `root` verbatim.
pub fn router(root: &Path) -> Router {
    Router::new()
        .fallback_service(ServeDir::new(root))
        .layer(TraceLayer::new_for_http())
}

/// A bound, not yet running, static server.
pub struct StaticServer {
    listener: TcpListener,
    root: PathBuf,
    host: String,
    addr: SocketAddr,
}

impl StaticServer {
    /// Bind `host:port`. Port 0 picks a free ephemeral port.
    pub async fn bind(
        root: impl Into<PathBuf>,
        host: &str,
        port: u16,
    ) -> Result<Self, Html2PdfError> {
        let bind_addr = format!("{host}:{port}");
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| Html2PdfError::BindFailed {
                addr: bind_addr.clone(),
                source: e,
            })?;
        let addr = listener
            .local_addr()
            .map_err(|e| Html2PdfError::BindFailed {
                addr: bind_addr,
                source: e,
            })?;

        Ok(Self {
            listener,
            root: root.into(),
            host: host.to_string(),
            addr,
        })
    }

    /// The address actually bound.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// `http://<host>:<bound port>/`.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}/", self.host, self.addr.port())
    }

    /// Serve until `shutdown` resolves.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), Html2PdfError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!(
            "Serving {} at {}",
            self.root.display(),
            self.base_url()
        );
        axum::serve(self.listener, router(&self.root))
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(Html2PdfError::ServerFailed)
    }

    /// Serve on a background task.
    pub fn spawn(self) -> ServerHandle {
        let (tx, rx) = oneshot::channel::<()>();
        let addr = self.addr;
        let base_url = self.base_url();
        let task = tokio::spawn(self.serve(async move {
            let _ = rx.await;
        }));
        ServerHandle {
            addr,
            base_url,
            shutdown_tx: Some(tx),
            task,
        }
    }
}

/// Handle to a server started with [`StaticServer::spawn`].
///
/// Dropping the handle also stops the server: the shutdown channel closes
/// and the graceful-shutdown future resolves.
pub struct ServerHandle {
    addr: SocketAddr,
    base_url: String,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<(), Html2PdfError>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Stop accepting connections and wait for the server task to finish.
    pub async fn shutdown(mut self) -> Result<(), Html2PdfError> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        (&mut self.task)
            .await
            .map_err(|e| Html2PdfError::Internal(format!("Server task panicked: {e}")))?
    }
}

/// Serve `root` on `host:port` until Ctrl-C.
pub async fn run_server(root: &Path, host: &str, port: u16) -> Result<(), Html2PdfError> {
    let server = StaticServer::bind(root, host, port).await?;
    server
        .serve(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Ctrl-C received, shutting down");
        })
        .await
}

/// HTTP client used by the probe and the per-file preflight.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, Html2PdfError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .no_proxy()
        .build()
        .map_err(|e| Html2PdfError::Internal(format!("HTTP client: {e}")))
}

/// Check that something answers HTTP at `base_url`.
///
/// Any response counts, including 404: a directory without `index.html`
/// is still a running server.
pub async fn probe(client: &reqwest::Client, base_url: &str) -> Result<(), Html2PdfError> {
    match client.get(base_url).send().await {
        Ok(resp) => {
            debug!("Probe {} → HTTP {}", base_url, resp.status());
            Ok(())
        }
        Err(e) => Err(Html2PdfError::ServerUnreachable {
            url: base_url.to_string(),
            reason: if e.is_timeout() {
                "timed out".to_string()
            } else if e.is_connect() {
                "connection refused".to_string()
            } else {
                e.to_string()
            },
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_files_below_root() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join("build")).unwrap();
        std::fs::write(tmp.path().join("build/a.html"), "<h1>A</h1>").unwrap();

        let server = StaticServer::bind(tmp.path(), "127.0.0.1", 0).await.unwrap();
        assert_ne!(server.local_addr().port(), 0);
        let handle = server.spawn();

        let client = http_client(Duration::from_secs(5)).unwrap();
        let url = format!("{}build/a.html", handle.base_url());
        let resp = client.get(&url).send().await.unwrap();
        assert!(resp.status().is_success());
        assert_eq!(resp.text().await.unwrap(), "<h1>A</h1>");

        let missing = client
            .get(format!("{}build/missing.html", handle.base_url()))
            .send()
            .await
            .unwrap();
        assert_eq!(missing.status().as_u16(), 404);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn probe_accepts_404_root() {
        let tmp = tempfile::tempdir().unwrap();
        let handle = StaticServer::bind(tmp.path(), "127.0.0.1", 0)
            .await
            .unwrap()
            .spawn();
        let client = http_client(Duration::from_secs(5)).unwrap();
        probe(&client, handle.base_url()).await.unwrap();
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn probe_fails_when_nothing_listens() {
        // Bind then drop to get a port that is very likely free.
        let port = {
            let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            l.local_addr().unwrap().port()
        };
        let client = http_client(Duration::from_secs(2)).unwrap();
        let err = probe(&client, &format!("http://127.0.0.1:{port}/"))
            .await
            .unwrap_err();
        assert!(matches!(err, Html2PdfError::ServerUnreachable { .. }), "got: {err}");
    }

    #[tokio::test]
    async fn bind_twice_on_same_port_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let first = StaticServer::bind(tmp.path(), "127.0.0.1", 0).await.unwrap();
        let port = first.local_addr().port();
        let err = StaticServer::bind(tmp.path(), "127.0.0.1", port)
            .await
            .err()
            .expect("second bind should fail");
        assert!(matches!(err, Html2PdfError::BindFailed { .. }), "got: {err}");
    }
}
