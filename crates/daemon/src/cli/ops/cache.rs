use clap::{Args, Subcommand};
use owo_colors::OwoColorize;

use rcmount_daemon::http_server::api::client::ApiError;
use rcmount_daemon::http_server::api::rclone::ClearCacheRequest;

use crate::cli::op::{Op, OpContext};

#[derive(Subcommand, Debug, Clone)]
pub enum CacheCommand {
    /// Delete and recreate the VFS cache directory
    Clear,
}

#[derive(Args, Debug, Clone)]
pub struct Cache {
    #[command(subcommand)]
    pub command: CacheCommand,
}

#[async_trait::async_trait]
impl Op for Cache {
    type Error = ApiError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        match self.command {
            CacheCommand::Clear => {
                let response = ctx.client.call(ClearCacheRequest {}).await?;
                let dir = response
                    .data
                    .map(|d| d.cache_dir)
                    .unwrap_or_default();
                Ok(format!("{} {}", "Cleared".green().bold(), dir))
            }
        }
    }
}
