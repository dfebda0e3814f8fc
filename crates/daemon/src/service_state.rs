use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use common::config::SharedConfig;

use crate::controller::MountController;
use crate::mount::{MountLifecycle, RcloneCliDriver};
use crate::probe::{ConnectionProbe, RcloneRcClient};

/// Shared state handed to every HTTP handler
#[derive(Debug, Clone)]
pub struct State {
    controller: MountController,
    shutdown: CancellationToken,
}

impl State {
    /// Wire the rclone CLI driver and RC client against `config`
    pub fn from_config(config: SharedConfig) -> Self {
        let lifecycle = MountLifecycle::new(Arc::new(RcloneCliDriver::new(config.clone())));
        let probe = ConnectionProbe::new(Arc::new(RcloneRcClient::new()));
        Self::new(MountController::new(config, lifecycle, probe))
    }

    pub fn new(controller: MountController) -> Self {
        Self {
            controller,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn controller(&self) -> &MountController {
        &self.controller
    }

    /// Cancelled when the service begins shutting down
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    /// Token for one request's driver or probe call; fires on shutdown
    pub fn request_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }
}
