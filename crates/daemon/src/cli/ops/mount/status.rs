use clap::Args;
use owo_colors::OwoColorize;

use common::mount_state::MountState;
use rcmount_daemon::http_server::api::client::ApiError;
use rcmount_daemon::http_server::api::rclone::MountStatusRequest;

use crate::cli::op::{Op, OpContext};

#[derive(Args, Debug, Clone)]
pub struct Status {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Green when attached, red on error, yellow while a transition runs
pub fn colored_state(state: MountState) -> String {
    match state {
        MountState::Mounted => state.green().to_string(),
        MountState::Error => state.red().to_string(),
        s if s.is_transitioning() => s.yellow().to_string(),
        s => s.to_string(),
    }
}

#[async_trait::async_trait]
impl Op for Status {
    type Error = ApiError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let response = ctx.client.call(MountStatusRequest {}).await?;
        let Some(status) = response.data else {
            return Ok("No status returned".to_string());
        };

        if self.json {
            return Ok(serde_json::to_string_pretty(&status).unwrap_or_default());
        }

        let state = colored_state(status.state);
        let mut output = format!(
            "{:<12} {}\n{:<12} {}\n{:<12} {}",
            "STATE",
            state,
            "PATH",
            status.mount_path.display(),
            "SINCE",
            status.since.format("%Y-%m-%d %H:%M:%S UTC"),
        );
        if let Some(err) = status.last_error {
            output.push_str(&format!("\n{:<12} {}", "LAST ERROR", err.red()));
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colored_state() {
        assert_eq!(colored_state(MountState::Unmounted), "unmounted");
        for state in [MountState::Mounting, MountState::Unmounting] {
            let colored = colored_state(state);
            assert!(colored.contains(state.as_str()));
            assert_ne!(colored, state.as_str());
        }
    }
}
