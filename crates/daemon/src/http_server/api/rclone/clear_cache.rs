//! VFS cache reset endpoint

use axum::extract::State;
use axum::response::Response;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use crate::controller::ControllerError;
use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::Envelope;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearCacheRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearCacheData {
    pub cache_dir: String,
}

pub type ClearCacheResponse = Envelope<ClearCacheData>;

pub async fn handler(State(state): State<ServiceState>) -> Result<Response, ControllerError> {
    let cache_dir = state.controller().clear_rclone_cache().await?;

    Ok(Envelope::ok_with_message(
        "Cache cleared successfully",
        Some(ClearCacheData {
            cache_dir: cache_dir.display().to_string(),
        }),
    )
    .with_status(http::StatusCode::OK))
}

impl ApiRequest for ClearCacheRequest {
    type Response = ClearCacheResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, url::ParseError> {
        Ok(client.delete(base_url.join("/api/rclone/cache")?))
    }
}
