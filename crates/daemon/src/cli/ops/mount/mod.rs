use clap::{Args, Subcommand};

pub mod start;
pub mod status;
pub mod stop;

use rcmount_daemon::http_server::api::client::ApiError;

use crate::cli::op::{Op, OpContext};

#[derive(Subcommand, Debug, Clone)]
pub enum MountCommand {
    /// Attach the configured remote at the mount path
    Start(start::Start),
    /// Detach the mount
    Stop(stop::Stop),
    /// Show the current mount state
    Status(status::Status),
    /// Validate mount settings without mounting
    Test(test::Test),
}

#[derive(Args, Debug, Clone)]
pub struct Mount {
    #[command(subcommand)]
    pub command: MountCommand,
}

#[async_trait::async_trait]
impl Op for Mount {
    type Error = ApiError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        match &self.command {
            MountCommand::Start(op) => op.execute(ctx).await,
            MountCommand::Stop(op) => op.execute(ctx).await,
            MountCommand::Status(op) => op.execute(ctx).await,
            MountCommand::Test(op) => op.execute(ctx).await,
        }
    }
}
