//! Orchestration surface for mount, probe and cache operations
//!
//! Input is validated here and never reaches the lifecycle or probe when
//! malformed. Probe outcomes, good or bad, come back as `Ok(ProbeResult)`.

use std::path::PathBuf;

use tokio_util::sync::CancellationToken;

use common::config::{Config, MountConfigOverride, SharedConfig};
use common::validation::ValidationError;

use crate::cache::{CacheError, CacheResetter};
use crate::mount::{MountError, MountLifecycle, MountStatus};
use crate::probe::{ConnectionProbe, ProbeRequest, ProbeResult};

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error(transparent)]
    Mount(#[from] MountError),
    #[error(transparent)]
    Cache(CacheError),
}

impl From<CacheError> for ControllerError {
    fn from(e: CacheError) -> Self {
        match e {
            CacheError::NotConfigured => ControllerError::NotConfigured("cache directory"),
            other => ControllerError::Cache(other),
        }
    }
}

impl ControllerError {
    /// True when the caller sent something unusable, as opposed to the
    /// operation failing
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ControllerError::Validation(_) | ControllerError::NotConfigured(_)
        )
    }
}

#[derive(Debug, Clone)]
pub struct MountController {
    config: SharedConfig,
    lifecycle: MountLifecycle,
    probe: ConnectionProbe,
    cache: CacheResetter,
}

impl MountController {
    pub fn new(config: SharedConfig, lifecycle: MountLifecycle, probe: ConnectionProbe) -> Self {
        Self {
            config,
            lifecycle,
            probe,
            cache: CacheResetter::new(),
        }
    }

    pub fn config(&self) -> &SharedConfig {
        &self.config
    }

    pub fn status(&self) -> MountStatus {
        self.lifecycle.status()
    }

    /// Start the mount and return the status after the transition
    pub async fn start_mount(
        &self,
        cancel: &CancellationToken,
    ) -> Result<MountStatus, ControllerError> {
        self.lifecycle.mount(cancel).await?;
        Ok(self.lifecycle.status())
    }

    pub async fn stop_mount(&self, cancel: &CancellationToken) -> Result<(), ControllerError> {
        self.lifecycle.unmount(cancel).await?;
        Ok(())
    }

    /// Validate the live config with `over` applied, without mounting or
    /// changing anything. Returns the hypothetical config.
    pub fn test_mount_config(&self, over: &MountConfigOverride) -> Result<Config, ControllerError> {
        let candidate = self.config.current().with_override(over);
        candidate.validate_mount()?;
        tracing::debug!(mount_path = %candidate.mount_path, "mount configuration is valid");
        Ok(candidate)
    }

    pub async fn test_rclone_connection(
        &self,
        cancel: &CancellationToken,
        request: &ProbeRequest,
    ) -> Result<ProbeResult, ControllerError> {
        Ok(self.probe.test_connection(cancel, request).await?)
    }

    /// Reset the cache directory named by the current config. Returns the
    /// path that was cleared.
    pub async fn clear_rclone_cache(&self) -> Result<PathBuf, ControllerError> {
        let cache_dir = self
            .config
            .current()
            .cache_dir()
            .ok_or(ControllerError::NotConfigured("cache directory"))?;
        self.cache.clear_cache(&cache_dir).await?;
        Ok(cache_dir)
    }
}
