use reqwest::{Client, StatusCode};
use serde::Deserialize;
use url::Url;

use super::{ProbeError, RemoteControlClient};

/// Talks to the rclone RC API over HTTP.
///
/// Only two calls are used: `rc/noop` for reachability and credentials, and
/// `vfs/list` to confirm the expected VFS is served.
#[derive(Debug, Clone)]
pub struct RcloneRcClient {
    http: Client,
}

#[derive(Debug, Deserialize)]
struct VfsList {
    #[serde(default)]
    vfses: Vec<String>,
}

impl Default for RcloneRcClient {
    fn default() -> Self {
        Self::new()
    }
}

impl RcloneRcClient {
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    pub fn with_client(http: Client) -> Self {
        Self { http }
    }

    fn endpoint(base: &str, method: &str) -> Result<Url, ProbeError> {
        let mut url = Url::parse(base)
            .map_err(|e| ProbeError::Unreachable(format!("invalid RC URL {:?}: {}", base, e)))?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        url.join(method)
            .map_err(|e| ProbeError::Unreachable(format!("invalid RC URL {:?}: {}", base, e)))
    }

    async fn call(
        &self,
        base: &str,
        user: &str,
        pass: &str,
        method: &str,
    ) -> Result<reqwest::Response, ProbeError> {
        let mut request = self
            .http
            .post(Self::endpoint(base, method)?)
            .json(&serde_json::json!({}));
        if !user.is_empty() {
            request = request.basic_auth(user, Some(pass));
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProbeError::Unreachable(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ProbeError::Auth(format!(
                "server returned {}",
                response.status()
            ))),
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                Err(ProbeError::Protocol(format!(
                    "{} returned {}: {}",
                    method,
                    status,
                    body.trim()
                )))
            }
            _ => Ok(response),
        }
    }
}

#[async_trait::async_trait]
impl RemoteControlClient for RcloneRcClient {
    async fn test_connection(
        &self,
        url: &str,
        user: &str,
        pass: &str,
        vfs_name: &str,
    ) -> Result<(), ProbeError> {
        self.call(url, user, pass, "rc/noop").await?;

        if vfs_name.is_empty() {
            return Ok(());
        }

        let list: VfsList = self
            .call(url, user, pass, "vfs/list")
            .await?
            .json()
            .await
            .map_err(|e| ProbeError::Protocol(format!("vfs/list: {}", e)))?;

        if list.vfses.iter().any(|name| name == vfs_name) {
            Ok(())
        } else {
            Err(ProbeError::VolumeMismatch {
                expected: vfs_name.to_string(),
                available: list.vfses,
            })
        }
    }
}
