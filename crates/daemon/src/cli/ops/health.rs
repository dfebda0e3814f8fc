use std::convert::Infallible;
use std::fmt;

use clap::Args;
use owo_colors::OwoColorize;

use common::config::Config;
use rcmount_daemon::http_server::api::rclone::MountStatusRequest;
use rcmount_daemon::http_server::health::liveness::LivezRequest;
use rcmount_daemon::MountStatus;

use crate::cli::op::{Op, OpContext};
use crate::cli::ops::mount::status::colored_state;

#[derive(Args, Debug, Clone)]
pub struct Health;

#[derive(Debug)]
pub enum EndpointStatus {
    Ok,
    Unhealthy(String),
    NotReachable,
}

#[derive(Debug)]
pub struct HealthOutput {
    pub config_error: Option<String>,
    pub mount_path: Option<String>,
    pub url: String,
    pub livez: EndpointStatus,
    pub mount: Option<MountStatus>,
}

impl fmt::Display for HealthOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", "Config".bold())?;
        match (&self.mount_path, &self.config_error) {
            (_, Some(err)) => writeln!(f, "  {} {}", "error:".red(), err)?,
            (Some(path), None) => {
                writeln!(f, "  {} {}", "config.toml:".dimmed(), "OK".green())?;
                writeln!(f, "  {} {}", "mount_path:".dimmed(), path)?;
            }
            (None, None) => {}
        }

        writeln!(f)?;
        writeln!(f, "{} ({}):", "Daemon".bold(), self.url)?;
        let livez = match &self.livez {
            EndpointStatus::Ok => "OK".green().to_string(),
            EndpointStatus::Unhealthy(code) => format!("{} ({})", "UNHEALTHY".red(), code),
            EndpointStatus::NotReachable => "NOT REACHABLE".red().to_string(),
        };
        write!(f, "  {} {}", "livez:".dimmed(), livez)?;

        if let Some(status) = &self.mount {
            let state = colored_state(status.state);
            writeln!(f)?;
            write!(f, "  {} {}", "mount:".dimmed(), state)?;
            if let Some(err) = &status.last_error {
                write!(f, " ({})", err)?;
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Op for Health {
    type Error = Infallible;
    type Output = HealthOutput;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let (mount_path, config_error) = match Config::load(&ctx.config_path) {
            Ok(config) => (Some(config.mount_path), None),
            Err(e) => (None, Some(e.to_string())),
        };

        let livez = match ctx.client.call(LivezRequest {}).await {
            Ok(_) => EndpointStatus::Ok,
            Err(rcmount_daemon::http_server::api::client::ApiError::Reqwest(_)) => {
                EndpointStatus::NotReachable
            }
            Err(e) => EndpointStatus::Unhealthy(e.to_string()),
        };

        let mount = match livez {
            EndpointStatus::Ok => ctx
                .client
                .call(MountStatusRequest {})
                .await
                .ok()
                .and_then(|envelope| envelope.data),
            _ => None,
        };

        Ok(HealthOutput {
            config_error,
            mount_path,
            url: ctx.client.base_url().to_string(),
            livez,
            mount,
        })
    }
}
