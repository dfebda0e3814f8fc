//! Start mount API endpoint

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use crate::controller::ControllerError;
use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::Envelope;
use crate::mount::MountStatus;
use crate::ServiceState;

/// Request to start the mount
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartMountRequest {}

/// Carries the status after the mount came up
pub type StartMountResponse = Envelope<MountStatus>;

pub async fn handler(State(state): State<ServiceState>) -> Result<Response, ControllerError> {
    let status = state
        .controller()
        .start_mount(&state.request_token())
        .await?;

    Ok((
        http::StatusCode::OK,
        Json(Envelope::ok_with_message(
            "Mount started successfully",
            Some(status),
        )),
    )
        .into_response())
}

impl ApiRequest for StartMountRequest {
    type Response = StartMountResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, url::ParseError> {
        Ok(client.post(base_url.join("/api/rclone/mount/start")?))
    }
}
