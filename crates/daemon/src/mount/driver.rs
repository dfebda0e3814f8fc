use std::path::PathBuf;

use tokio_util::sync::CancellationToken;

/// Errors reported by a mount driver
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("operation cancelled")]
    Cancelled,
    #[error("not configured: {0}")]
    NotConfigured(&'static str),
    #[error("{0}")]
    Failed(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Attaches and detaches the filesystem for one mount target.
///
/// Both calls may block until the OS-level operation completes. They should
/// return promptly once `cancel` fires; the lifecycle also stops polling them
/// at that point.
#[async_trait::async_trait]
pub trait MountDriver: Send + Sync + 'static {
    async fn mount(&self, cancel: &CancellationToken) -> Result<(), DriverError>;

    async fn unmount(&self, cancel: &CancellationToken) -> Result<(), DriverError>;

    /// Where the filesystem is (or would be) attached
    fn mount_path(&self) -> PathBuf;
}
