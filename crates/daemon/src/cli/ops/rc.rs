use clap::{Args, Subcommand};
use owo_colors::OwoColorize;

use rcmount_daemon::http_server::api::client::ApiError;
use rcmount_daemon::http_server::api::rclone::TestConnectionRequest;
use rcmount_daemon::ProbeRequest;

use crate::cli::op::{Op, OpContext};

#[derive(Args, Debug, Clone)]
pub struct TestConnection {
    /// RC endpoint URL, e.g. http://127.0.0.1:5572
    #[arg(long)]
    pub url: String,

    #[arg(long, default_value = "")]
    pub user: String,

    #[arg(long, default_value = "", env = "RCMOUNT_RC_PASS", hide_env_values = true)]
    pub pass: String,

    /// Require this VFS to be served by the endpoint
    #[arg(long, default_value = "")]
    pub vfs_name: String,
}

#[derive(Subcommand, Debug, Clone)]
pub enum RcCommand {
    /// Check that an RC endpoint is reachable with the given credentials
    Test(TestConnection),
}

#[derive(Args, Debug, Clone)]
pub struct Rc {
    #[command(subcommand)]
    pub command: RcCommand,
}

#[async_trait::async_trait]
impl Op for Rc {
    type Error = ApiError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let RcCommand::Test(args) = &self.command;
        let request = TestConnectionRequest {
            probe: ProbeRequest {
                rc_url: args.url.clone(),
                rc_user: args.user.clone(),
                rc_pass: args.pass.clone(),
                vfs_name: args.vfs_name.clone(),
            },
        };

        let response = ctx.client.call(request).await?;
        let Some(data) = response.data else {
            return Ok(response.message.unwrap_or_default());
        };
        if data.success {
            Ok(format!(
                "{} {}",
                "OK".green().bold(),
                data.message.unwrap_or_default()
            ))
        } else {
            Ok(format!("{} {}", "FAILED".red().bold(), data.error_message))
        }
    }
}
