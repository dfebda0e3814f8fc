//! Mount status API endpoint

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::Envelope;
use crate::mount::MountStatus;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MountStatusRequest {}

pub type MountStatusResponse = Envelope<MountStatus>;

pub async fn handler(State(state): State<ServiceState>) -> Response {
    let status = state.controller().status();
    (http::StatusCode::OK, Json(Envelope::ok(status))).into_response()
}

impl ApiRequest for MountStatusRequest {
    type Response = MountStatusResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, url::ParseError> {
        Ok(client.get(base_url.join("/api/rclone/mount/status")?))
    }
}
