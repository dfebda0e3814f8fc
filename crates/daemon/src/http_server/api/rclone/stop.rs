//! Stop mount API endpoint (also served as `DELETE /mount`)

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use crate::controller::ControllerError;
use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::Envelope;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopMountRequest {}

pub type StopMountResponse = Envelope<()>;

pub async fn handler(State(state): State<ServiceState>) -> Result<Response, ControllerError> {
    state.controller().stop_mount(&state.request_token()).await?;

    Ok((
        http::StatusCode::OK,
        Json(Envelope::<()>::ok_with_message(
            "Mount stopped successfully",
            None,
        )),
    )
        .into_response())
}

impl ApiRequest for StopMountRequest {
    type Response = StopMountResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, url::ParseError> {
        Ok(client.post(base_url.join("/api/rclone/mount/stop")?))
    }
}
