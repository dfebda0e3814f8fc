use reqwest::{header::HeaderMap, header::HeaderValue, Client};
use url::Url;

use super::error::ApiError;
use super::ApiRequest;
use crate::http_server::api::Envelope;

#[derive(Debug, Clone)]
pub struct ApiClient {
    pub remote: Url,
    client: Client,
}

impl ApiClient {
    pub fn new(remote: &Url) -> Result<Self, ApiError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder().default_headers(default_headers).build()?;

        Ok(Self {
            remote: remote.clone(),
            client,
        })
    }

    pub async fn call<T: ApiRequest>(&self, request: T) -> Result<T::Response, ApiError> {
        let request_builder = request.build_request(&self.remote, &self.client)?;
        let response = request_builder.send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T::Response>().await?);
        }

        let body = response.text().await?;
        match serde_json::from_str::<Envelope<serde_json::Value>>(&body) {
            Ok(envelope) => Err(ApiError::Api {
                status,
                message: envelope.message.unwrap_or_else(|| status.to_string()),
                details: envelope.details,
            }),
            Err(_) => Err(ApiError::HttpStatus(status, body)),
        }
    }

    /// Get the base URL for API requests
    pub fn base_url(&self) -> &Url {
        &self.remote
    }
}
