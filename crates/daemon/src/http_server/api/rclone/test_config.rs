//! Dry-run validation of mount configuration overrides

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::config::MountConfigOverride;

use crate::controller::ControllerError;
use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::Envelope;
use crate::ServiceState;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestMountConfigRequest {
    #[serde(flatten)]
    pub overrides: MountConfigOverride,
}

/// Effective mount settings after the override was applied
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestMountConfigData {
    pub mount_path: String,
    pub remote: String,
}

pub type TestMountConfigResponse = Envelope<TestMountConfigData>;

#[derive(Debug, thiserror::Error)]
pub enum TestMountConfigError {
    #[error("Invalid request body")]
    InvalidBody(#[from] JsonRejection),
    #[error(transparent)]
    Controller(#[from] ControllerError),
}

impl IntoResponse for TestMountConfigError {
    fn into_response(self) -> Response {
        match self {
            TestMountConfigError::InvalidBody(rejection) => {
                Envelope::failure("Invalid request body", Some(rejection.body_text()))
                    .with_status(http::StatusCode::BAD_REQUEST)
            }
            TestMountConfigError::Controller(e) => e.into_response(),
        }
    }
}

pub async fn handler(
    State(state): State<ServiceState>,
    body: Result<Json<TestMountConfigRequest>, JsonRejection>,
) -> Result<Response, TestMountConfigError> {
    let Json(req) = body?;
    let candidate = state.controller().test_mount_config(&req.overrides)?;

    Ok(Envelope::ok_with_message(
        "Mount configuration is valid",
        Some(TestMountConfigData {
            mount_path: candidate.mount_path.clone(),
            remote: candidate.rclone.remote.clone(),
        }),
    )
    .with_status(http::StatusCode::OK))
}

impl ApiRequest for TestMountConfigRequest {
    type Response = TestMountConfigResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, url::ParseError> {
        Ok(client
            .post(base_url.join("/api/rclone/mount/test")?)
            .json(&self))
    }
}
