use axum::Router;

use crate::ServiceState;

pub mod client;
pub mod rclone;
mod response;

pub use response::Envelope;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .nest("/rclone", rclone::router(state.clone()))
        .with_state(state)
}
