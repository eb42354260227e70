//! HTTP listener and connection loop.
//!
//! Accepts plain TCP connections and serves each with hyper's auto
//! (HTTP/1 + HTTP/2) connection builder. The shutdown token stops the
//! accept loop and cancels in-flight calls through the per-request child
//! tokens; whatever is still open after the drain window gets aborted.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::gateway::Gateway;

const DRAIN_WINDOW: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
}

/// Run the gateway until the shutdown token fires.
pub async fn serve(
    gateway: Arc<Gateway>,
    addr: SocketAddr,
    shutdown: CancellationToken,
) -> Result<(), ServerError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    tracing::info!(%addr, "listening");

    let mut connections = JoinSet::new();
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(pair) => pair,
                    Err(err) => {
                        tracing::warn!(error = %err, "accept failed");
                        continue;
                    }
                };
                connections.spawn(serve_connection(gateway.clone(), shutdown.clone(), stream, peer));
            }
        }
    }

    tracing::info!("shutting down, draining connections");
    let drain = async {
        while connections.join_next().await.is_some() {}
    };
    if tokio::time::timeout(DRAIN_WINDOW, drain).await.is_err() {
        tracing::warn!("drain window elapsed, aborting remaining connections");
        connections.shutdown().await;
    }
    Ok(())
}

async fn serve_connection(
    gateway: Arc<Gateway>,
    shutdown: CancellationToken,
    stream: tokio::net::TcpStream,
    peer: SocketAddr,
) {
    let io = TokioIo::new(stream);
    let service = service_fn(move |req| {
        let gateway = gateway.clone();
        let cancel = shutdown.clone();
        async move { Ok::<_, Infallible>(gateway.handle(req, cancel).await) }
    });

    if let Err(err) = auto::Builder::new(TokioExecutor::new())
        .serve_connection(io, service)
        .await
    {
        tracing::debug!(%peer, error = %err, "connection ended with error");
    }
}
