use clap::Args;
use owo_colors::OwoColorize;

use rcmount_daemon::http_server::api::client::ApiError;
use rcmount_daemon::http_server::api::rclone::StartMountRequest;

use crate::cli::op::{Op, OpContext};

#[derive(Args, Debug, Clone)]
pub struct Start;

#[async_trait::async_trait]
impl Op for Start {
    type Error = ApiError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let response = ctx.client.call(StartMountRequest {}).await?;
        let path = response
            .data
            .map(|status| status.mount_path.display().to_string())
            .unwrap_or_default();
        Ok(format!("{} {}", "Mounted".green().bold(), path))
    }
}
