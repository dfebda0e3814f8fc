use std::path::PathBuf;

use rcmount_daemon::http_server::api::client::ApiClient;

/// Shared inputs for every CLI operation
#[derive(Debug, Clone)]
pub struct OpContext {
    /// Client pointed at the daemon's API
    pub client: ApiClient,
    /// Config file the daemon reads, or that `init` writes
    pub config_path: PathBuf,
}

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;
    type Output: std::fmt::Display;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}
