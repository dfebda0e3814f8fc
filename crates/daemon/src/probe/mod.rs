//! Connectivity checks against an rclone remote-control endpoint
//!
//! A probe is submitted by a person testing their settings, so it must come
//! back within [`PROBE_TIMEOUT`] and a negative answer is an ordinary
//! [`ProbeResult`], not an error. The only error is a request that could not
//! be probed at all (no URL).

mod rc_client;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use common::validation::ValidationError;

pub use rc_client::RcloneRcClient;

/// Upper bound on a single connectivity probe
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProbeRequest {
    #[serde(default)]
    pub rc_url: String,
    #[serde(default)]
    pub rc_user: String,
    #[serde(default)]
    pub rc_pass: String,
    #[serde(default)]
    pub vfs_name: String,
}

impl std::fmt::Debug for ProbeRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeRequest")
            .field("rc_url", &self.rc_url)
            .field("rc_user", &self.rc_user)
            .field("rc_pass", &"***")
            .field("vfs_name", &self.vfs_name)
            .finish()
    }
}

/// Outcome of a probe that ran
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub reachable: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    #[error("timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("probe cancelled before completion")]
    Cancelled,
    #[error("endpoint unreachable: {0}")]
    Unreachable(String),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("VFS {expected:?} not found on endpoint (available: {available:?})")]
    VolumeMismatch {
        expected: String,
        available: Vec<String>,
    },
    #[error("unexpected response: {0}")]
    Protocol(String),
}

impl ProbeError {
    /// Timeouts and caller cancellation are reported the same way
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProbeError::Timeout(_) | ProbeError::Cancelled)
    }
}

/// Client for the remote-control endpoint.
///
/// An implementation checks reachability and credentials, then, if
/// `vfs_name` is non-empty, that the endpoint knows a VFS by that name.
#[async_trait::async_trait]
pub trait RemoteControlClient: Send + Sync + 'static {
    async fn test_connection(
        &self,
        url: &str,
        user: &str,
        pass: &str,
        vfs_name: &str,
    ) -> Result<(), ProbeError>;
}

#[derive(Clone)]
pub struct ConnectionProbe {
    client: Arc<dyn RemoteControlClient>,
    timeout: Duration,
}

impl ConnectionProbe {
    pub fn new(client: Arc<dyn RemoteControlClient>) -> Self {
        Self {
            client,
            timeout: PROBE_TIMEOUT,
        }
    }

    /// Probe the endpoint named in `request`.
    ///
    /// Returns within the probe timeout, or sooner if `cancel` fires.
    pub async fn test_connection(
        &self,
        cancel: &CancellationToken,
        request: &ProbeRequest,
    ) -> Result<ProbeResult, ValidationError> {
        let url = request.rc_url.trim();
        if url.is_empty() {
            return Err(ValidationError::MissingField("rc_url"));
        }

        let call = self.client.test_connection(
            url,
            &request.rc_user,
            &request.rc_pass,
            request.vfs_name.trim(),
        );

        let outcome = tokio::select! {
            _ = cancel.cancelled() => Err(ProbeError::Cancelled),
            result = tokio::time::timeout(self.timeout, call) => {
                result.unwrap_or(Err(ProbeError::Timeout(self.timeout)))
            }
        };

        Ok(match outcome {
            Ok(()) => {
                tracing::info!(rc_url = %url, vfs_name = %request.vfs_name, "RC endpoint reachable");
                ProbeResult {
                    reachable: true,
                    message: format!("Connected to external RC server at {}", url),
                }
            }
            Err(e) => {
                tracing::warn!(rc_url = %url, error = %e, timeout = e.is_timeout(), "RC probe failed");
                ProbeResult {
                    reachable: false,
                    message: format!("Failed to connect to external RC server: {}", e),
                }
            }
        })
    }
}

impl std::fmt::Debug for ConnectionProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionProbe")
            .field("timeout", &self.timeout)
            .finish()
    }
}
