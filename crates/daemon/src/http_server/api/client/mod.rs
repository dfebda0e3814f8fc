//! Typed HTTP client for the daemon API, used by the CLI

#[allow(clippy::module_inception)]
mod client;
mod error;

use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

pub use client::ApiClient;
pub use error::ApiError;

/// An API operation the client knows how to send
pub trait ApiRequest {
    type Response: DeserializeOwned;

    fn build_request(self, base_url: &Url, client: &Client)
        -> Result<RequestBuilder, url::ParseError>;
}
