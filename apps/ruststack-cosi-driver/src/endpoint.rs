//! Listen endpoints: parsing, Unix socket lifecycle and the health probe.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, UnixListener, UnixStream};
use tracing::{debug, warn};

use ruststack_cosi_http::service::HEALTH_PATH;

/// Where the driver listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// A TCP address, e.g. `0.0.0.0:9000`.
    Tcp(String),
    /// A Unix domain socket path.
    Unix(PathBuf),
}

impl FromStr for Endpoint {
    type Err = anyhow::Error;

    /// Accepts `unix:///path`, `unix:path`, `tcp://host:port` and bare `host:port`.
    fn from_str(s: &str) -> Result<Self> {
        if let Some(path) = s.strip_prefix("unix://").or_else(|| s.strip_prefix("unix:")) {
            anyhow::ensure!(!path.is_empty(), "unix endpoint without a path: {s}");
            return Ok(Self::Unix(PathBuf::from(path)));
        }
        let addr = s.strip_prefix("tcp://").unwrap_or(s);
        anyhow::ensure!(
            !addr.contains("://") && addr.contains(':'),
            "unable to parse COSI endpoint: {s}"
        );
        Ok(Self::Tcp(addr.to_owned()))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp(addr) => write!(f, "tcp://{addr}"),
            Self::Unix(path) => write!(f, "unix://{}", path.display()),
        }
    }
}

/// Removes the socket file when dropped.
#[derive(Debug)]
pub struct SocketCleanup(PathBuf);

impl Drop for SocketCleanup {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.0) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.0.display(), error = %e, "failed to remove socket");
            }
        }
    }
}

/// Bind a Unix socket, replacing a stale socket file left by an unclean exit.
pub fn bind_unix(path: &Path) -> Result<(UnixListener, SocketCleanup)> {
    match std::fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "removed stale socket"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(e).with_context(|| format!("cannot remove stale socket {}", path.display()));
        }
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create socket directory {}", parent.display()))?;
    }
    let listener = UnixListener::bind(path)
        .with_context(|| format!("failed to bind to {}", path.display()))?;
    Ok((listener, SocketCleanup(path.to_owned())))
}

/// Request the health endpoint and check that the driver reports itself running.
pub async fn probe_health(endpoint: &Endpoint) -> Result<()> {
    let response = match endpoint {
        Endpoint::Tcp(addr) => {
            let addr = addr.replace("0.0.0.0", "127.0.0.1");
            let stream = TcpStream::connect(&addr)
                .await
                .with_context(|| format!("cannot connect to {addr}"))?;
            request_health(stream, &addr).await?
        }
        Endpoint::Unix(path) => {
            let stream = UnixStream::connect(path)
                .await
                .with_context(|| format!("cannot connect to {}", path.display()))?;
            request_health(stream, "localhost").await?
        }
    };

    if response.starts_with("HTTP/1.1 200") && response.contains("\"status\":\"running\"") {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {endpoint}")
    }
}

async fn request_health<S: AsyncRead + AsyncWrite + Unpin>(mut stream: S, host: &str) -> Result<String> {
    let request = format!("GET {HEALTH_PATH} HTTP/1.1\r\nHost: {host}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await?;

    let mut response = String::new();
    stream.read_to_string(&mut response).await?;
    Ok(response)
}
