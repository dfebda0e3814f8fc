use clap::Args;
use owo_colors::OwoColorize;

use rcmount_daemon::http_server::api::client::ApiError;
use rcmount_daemon::http_server::api::rclone::StopMountRequest;

use crate::cli::op::{Op, OpContext};

#[derive(Args, Debug, Clone)]
pub struct Stop;

#[async_trait::async_trait]
impl Op for Stop {
    type Error = ApiError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let response = ctx.client.call(StopMountRequest {}).await?;
        Ok(response
            .message
            .unwrap_or_else(|| "Unmounted".to_string())
            .green()
            .to_string())
    }
}
