//! Service process: HTTP listener, signal handling and shutdown

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use common::mount_state::MountState;

use crate::http_server;
use crate::ServiceState;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("http server error: {0}")]
    Serve(#[source] std::io::Error),
    #[error("service task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Handle to a running service started with [`start_service`]
#[derive(Debug)]
pub struct ShutdownHandle {
    state: ServiceState,
    server: JoinHandle<Result<(), ServiceError>>,
}

impl ShutdownHandle {
    /// Stop accepting requests, cancel in-flight driver calls, then detach
    /// the mount if it is still attached.
    pub async fn shutdown(self) -> Result<(), ServiceError> {
        tracing::info!("shutting down");
        self.state.shutdown_token().cancel();
        self.server.await??;
        unmount_on_exit(&self.state).await;
        Ok(())
    }
}

/// Bind `listen_addr` and serve the API in the background. Returns the bound
/// address (useful when the port was 0).
pub async fn start_service(
    state: ServiceState,
    listen_addr: SocketAddr,
) -> Result<(SocketAddr, ShutdownHandle), ServiceError> {
    let listener = TcpListener::bind(listen_addr)
        .await
        .map_err(|source| ServiceError::Bind {
            addr: listen_addr,
            source,
        })?;
    let bound = listener.local_addr().map_err(ServiceError::Serve)?;
    tracing::info!(addr = %bound, "API server listening");

    let app = http_server::router(state.clone());
    let shutdown = state.shutdown_token().clone();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .map_err(ServiceError::Serve)
    });

    Ok((bound, ShutdownHandle { state, server }))
}

/// Run the service until ctrl-c (or SIGTERM). SIGHUP reloads the config file.
pub async fn spawn_service(
    state: ServiceState,
    listen_addr: SocketAddr,
) -> Result<(), ServiceError> {
    let (_, handle) = start_service(state.clone(), listen_addr).await?;

    #[cfg(unix)]
    spawn_reload_on_hangup(state.clone(), state.shutdown_token().clone());

    wait_for_termination(state.shutdown_token()).await;
    handle.shutdown().await
}

async fn unmount_on_exit(state: &ServiceState) {
    let status = state.controller().status();
    if status.state == MountState::Unmounted {
        return;
    }
    tracing::info!(state = %status.state, "unmounting before exit");
    // the shutdown token is already cancelled, so use a fresh one
    if let Err(e) = state.controller().stop_mount(&CancellationToken::new()).await {
        tracing::error!(error = %e, "failed to unmount on exit");
    }
}

/// Resolve on ctrl-c, SIGTERM or `shutdown`. A signal that cannot be
/// registered is logged and dropped from the wait set, so a broken handler
/// never ends the service on its own.
async fn wait_for_termination(shutdown: &CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "ctrl-c handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl-c"),
        _ = terminate => tracing::info!("received SIGTERM"),
        _ = shutdown.cancelled() => {},
    }
}

#[cfg(unix)]
fn spawn_reload_on_hangup(state: ServiceState, shutdown: CancellationToken) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(hangup) => hangup,
        Err(e) => {
            tracing::warn!(error = %e, "SIGHUP handler unavailable, config reload disabled");
            return;
        }
    };

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                received = hangup.recv() => {
                    if received.is_none() {
                        break;
                    }
                    if let Err(e) = state.controller().config().reload() {
                        tracing::error!(error = %e, "config reload failed, keeping previous config");
                    }
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_termination_wait_ends_on_shutdown_token() {
        let shutdown = CancellationToken::new();
        let waiter = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move { wait_for_termination(&shutdown).await })
        };

        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .expect("wait did not observe the shutdown token")
            .unwrap();
    }
}
