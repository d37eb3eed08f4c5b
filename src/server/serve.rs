//! Serve loop with bounded graceful shutdown.

use std::future::Future;
use std::io;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{info, warn};

/// Drain window used by the binary on shutdown.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Serve `router` on `listener` until `shutdown` resolves.
///
/// Once the signal fires, the server stops accepting connections and waits
/// up to `drain` for in-flight requests to finish. Requests still running
/// after that are aborted.
pub async fn serve<F>(
    listener: TcpListener,
    router: Router,
    shutdown: F,
    drain: Duration,
) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (tx, rx) = oneshot::channel::<()>();

    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        rx.await.ok();
    });
    let mut handle = tokio::spawn(async move { server.await });

    tokio::select! {
        result = &mut handle => return flatten(result),
        _ = shutdown => {}
    }

    info!(
        drain_secs = drain.as_secs_f64(),
        "Shutdown requested, draining in-flight requests"
    );
    let _ = tx.send(());

    match tokio::time::timeout(drain, &mut handle).await {
        Ok(result) => {
            info!("Server stopped");
            flatten(result)
        }
        Err(_) => {
            warn!("In-flight requests did not finish within the drain window, aborting");
            handle.abort();
            Ok(())
        }
    }
}

fn flatten(result: Result<io::Result<()>, tokio::task::JoinError>) -> io::Result<()> {
    result.map_err(io::Error::other)?
}
