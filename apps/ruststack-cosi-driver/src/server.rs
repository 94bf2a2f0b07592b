//! Accept loop with graceful shutdown, shared by TCP and Unix listeners.

use std::future::Future;
use std::io;
use std::time::Duration;

use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream, UnixListener, UnixStream};
use tracing::{error, info, warn};

use ruststack_cosi_http::dispatch::CosiHandler;
use ruststack_cosi_http::service::CosiHttpService;

/// How long in-flight requests may run after a shutdown signal.
pub const GRACE_PERIOD: Duration = Duration::from_secs(5);

/// A listener the accept loop can pull connections from.
pub trait Accept: Send {
    /// Connection stream type.
    type Io: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Accept one connection, returning it with a printable peer address.
    fn accept_conn(&self) -> impl Future<Output = io::Result<(Self::Io, String)>> + Send;
}

impl Accept for TcpListener {
    type Io = TcpStream;

    async fn accept_conn(&self) -> io::Result<(TcpStream, String)> {
        let (stream, peer) = self.accept().await?;
        Ok((stream, peer.to_string()))
    }
}

impl Accept for UnixListener {
    type Io = UnixStream;

    async fn accept_conn(&self) -> io::Result<(UnixStream, String)> {
        let (stream, peer) = self.accept().await?;
        let peer = peer
            .as_pathname()
            .map_or_else(|| "unix:unnamed".to_owned(), |p| p.display().to_string());
        Ok((stream, peer))
    }
}

/// Wait for Ctrl-C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "cannot install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    info!("received shutdown signal, draining connections");
}

/// Run the accept loop until `shutdown` resolves, then drain connections for
/// at most [`GRACE_PERIOD`].
pub async fn serve<L, H>(
    listener: L,
    service: CosiHttpService<H>,
    shutdown: impl Future<Output = ()>,
) where
    L: Accept,
    H: CosiHandler,
{
    let graceful = GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept_conn() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    if tokio::time::timeout(GRACE_PERIOD, graceful.shutdown())
        .await
        .is_ok()
    {
        info!("all connections drained, exiting");
    } else {
        warn!(grace_period = ?GRACE_PERIOD, "grace period elapsed, dropping open connections");
    }
}
