//! RC endpoint connectivity test
//!
//! An unreachable endpoint is a successful request with
//! `data.success = false`. Only a request that cannot be probed at all is
//! rejected, with 422.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::validation::ValidationError;

use crate::controller::ControllerError;
use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::Envelope;
use crate::probe::ProbeRequest;
use crate::ServiceState;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestConnectionRequest {
    #[serde(flatten)]
    pub probe: ProbeRequest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionTestData {
    pub success: bool,
    /// Empty when the endpoint was reachable
    #[serde(default)]
    pub error_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub type TestConnectionResponse = Envelope<ConnectionTestData>;

#[derive(Debug, thiserror::Error)]
pub enum TestConnectionError {
    #[error("Invalid JSON in request body")]
    InvalidBody(#[from] JsonRejection),
    #[error(transparent)]
    Controller(#[from] ControllerError),
}

impl IntoResponse for TestConnectionError {
    fn into_response(self) -> Response {
        match self {
            TestConnectionError::InvalidBody(rejection) => {
                Envelope::failure("Invalid JSON in request body", Some(rejection.body_text()))
                    .with_status(http::StatusCode::UNPROCESSABLE_ENTITY)
            }
            TestConnectionError::Controller(ControllerError::Validation(e)) => {
                let message = match e {
                    ValidationError::MissingField("rc_url") => "RC URL is required".to_string(),
                    ref other => other.to_string(),
                };
                Envelope::failure(message, Some(e.code()))
                    .with_status(http::StatusCode::UNPROCESSABLE_ENTITY)
            }
            TestConnectionError::Controller(e) => e.into_response(),
        }
    }
}

pub async fn handler(
    State(state): State<ServiceState>,
    body: Result<Json<TestConnectionRequest>, JsonRejection>,
) -> Result<Response, TestConnectionError> {
    let Json(req) = body?;
    let result = state
        .controller()
        .test_rclone_connection(&state.request_token(), &req.probe)
        .await?;

    let data = if result.reachable {
        ConnectionTestData {
            success: true,
            error_message: String::new(),
            message: Some(result.message.clone()),
        }
    } else {
        ConnectionTestData {
            success: false,
            error_message: result.message.clone(),
            message: None,
        }
    };

    Ok(Envelope::ok_with_message(result.message, Some(data)).with_status(http::StatusCode::OK))
}

impl ApiRequest for TestConnectionRequest {
    type Response = TestConnectionResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, url::ParseError> {
        Ok(client.post(base_url.join("/api/rclone/test")?).json(&self))
    }
}
