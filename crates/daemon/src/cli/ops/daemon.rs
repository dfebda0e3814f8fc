use std::net::SocketAddr;

use clap::Args;

use common::config::{ConfigError, SharedConfig};
use rcmount_daemon::{spawn_service, ServiceError, ServiceState};

use crate::cli::op::{Op, OpContext};

#[derive(Args, Debug, Clone)]
pub struct Daemon {
    /// Address for the API server; defaults to `api.listen_addr` from config
    #[arg(long)]
    pub listen: Option<SocketAddr>,
}

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("failed to load config (run `rcmount init` first?): {0}")]
    Config(#[from] ConfigError),
    #[error("invalid api.listen_addr {addr:?}: {source}")]
    ListenAddr {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error(transparent)]
    Service(#[from] ServiceError),
}

#[async_trait::async_trait]
impl Op for Daemon {
    type Error = DaemonError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let config = SharedConfig::from_file(ctx.config_path.clone())?;
        let listen_addr = match self.listen {
            Some(addr) => addr,
            None => {
                let addr = config.current().api.listen_addr.clone();
                addr.parse()
                    .map_err(|source| DaemonError::ListenAddr { addr, source })?
            }
        };

        tracing::info!(
            config = %ctx.config_path.display(),
            listen = %listen_addr,
            "starting rcmount daemon"
        );
        spawn_service(ServiceState::from_config(config), listen_addr).await?;

        Ok("daemon stopped".to_string())
    }
}
