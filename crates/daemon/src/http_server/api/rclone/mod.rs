//! rclone mount management API endpoints
//!
//! - RC endpoint connection test
//! - VFS cache clearing
//! - Mount status, start, stop and dry-run config test

use axum::routing::{delete, get, post};
use axum::Router;

use crate::ServiceState;

mod clear_cache;
mod start;
mod status;
mod stop;
mod test_config;
mod test_connection;

// Re-export request/response types for use by CLI and other clients
pub use clear_cache::{ClearCacheData, ClearCacheRequest, ClearCacheResponse};
pub use start::{StartMountRequest, StartMountResponse};
pub use status::{MountStatusRequest, MountStatusResponse};
pub use stop::{StopMountRequest, StopMountResponse};
pub use test_config::{TestMountConfigData, TestMountConfigRequest, TestMountConfigResponse};
pub use test_connection::{ConnectionTestData, TestConnectionRequest, TestConnectionResponse};

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/test", post(test_connection::handler))
        .route("/cache", delete(clear_cache::handler))
        .route("/mount", delete(stop::handler))
        .route("/mount/status", get(status::handler))
        .route("/mount/start", post(start::handler))
        .route("/mount/stop", post(stop::handler))
        .route("/mount/test", post(test_config::handler))
        .with_state(state)
}
