//! Uniform response envelope
//!
//! Every API response is `{success, message?, data?, details?}`. Client
//! mistakes come back as 4xx, operational failures as 5xx.

use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::controller::ControllerError;
use crate::mount::MountError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Machine-readable error code or underlying cause
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            details: None,
        }
    }

    pub fn ok_with_message(message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data,
            details: None,
        }
    }
}

impl Envelope<()> {
    pub fn failure(message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
            details,
        }
    }
}

impl<T: Serialize> Envelope<T> {
    pub fn with_status(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

impl IntoResponse for ControllerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ControllerError::Validation(_) | ControllerError::NotConfigured(_) => {
                StatusCode::BAD_REQUEST
            }
            ControllerError::Mount(MountError::Busy) => StatusCode::CONFLICT,
            ControllerError::Mount(_) | ControllerError::Cache(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let details = match &self {
            ControllerError::Validation(e) => Some(e.code()),
            ControllerError::Mount(MountError::Busy) => Some("BUSY".to_string()),
            _ => None,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        Envelope::failure(self.to_string(), details).with_status(status)
    }
}
