//! HTTP surface of the daemon
//!
//! - `/_status/livez`: liveness
//! - `/api/rclone/...`: mount lifecycle, connection tests and cache management

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::ServiceState;

pub mod api;
pub mod health;

pub fn router(state: ServiceState) -> Router {
    Router::new()
        .route("/_status/livez", get(health::liveness::handler))
        .nest("/api", api::router(state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
