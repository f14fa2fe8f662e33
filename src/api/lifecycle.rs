//! Process-level fault isolation and background work.
//!
//! Errors and panics from work running outside a request's call chain are
//! logged and swallowed here. They never change the operating mode and never
//! terminate the process.

use anyhow::Result;
use std::{any::Any, future::Future, time::Duration};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, error, info};

use crate::identity::IdentityProviderHandle;

/// Route panics through `tracing` instead of bare stderr.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let location = info.location().map_or_else(
            || "unknown".to_string(),
            |location| format!("{}:{}", location.file(), location.line()),
        );
        error!(location = %location, "panic: {}", panic_message(info.payload()));
    }));
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Spawn a background task whose failure or panic is logged, never propagated.
pub fn spawn_logged<F>(name: &'static str, task: F) -> JoinHandle<()>
where
    F: Future<Output = Result<()>> + Send + 'static,
{
    let handle = tokio::spawn(task);
    tokio::spawn(async move {
        match handle.await {
            Ok(Ok(())) => debug!(task = name, "background task finished"),
            Ok(Err(err)) => error!(task = name, "background task failed: {err:#}"),
            Err(join_err) if join_err.is_panic() => {
                error!(task = name, "background task panicked: {join_err}");
            }
            Err(join_err) => debug!(task = name, "background task cancelled: {join_err}"),
        }
    })
}

/// Periodically drop expired sessions until shutdown is signalled.
pub fn spawn_session_sweeper(
    provider: IdentityProviderHandle,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    spawn_logged("session-sweeper", async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match provider.purge_expired().await {
                        Ok(0) => {}
                        Ok(purged) => debug!(purged, "expired sessions purged"),
                        Err(err) => error!("session sweep failed: {err}"),
                    }
                }
                _ = shutdown.changed() => break,
            }
        }

        Ok(())
    })
}

/// Resolve on `SIGINT` or `SIGTERM`, then tell background tasks to stop.
pub async fn shutdown_signal(notify: watch::Sender<bool>) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("failed to listen for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!("failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Gracefully shutdown");
    let _ = notify.send(true);
}
