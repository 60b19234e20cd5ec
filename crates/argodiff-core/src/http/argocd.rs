//! Argo CD REST client for listing applications

use crate::config::RunConfig;
use crate::error::{Error, Result};
use crate::traits::ApplicationSource;
use crate::types::Application;
use async_trait::async_trait;
use log::info;
use serde::Deserialize;

/// `GET /api/v1/applications` response; `items` is `null` when there are none
#[derive(Debug, Default, Deserialize)]
struct ApplicationList {
    #[serde(default)]
    items: Option<Vec<Application>>,
}

/// Argo CD API client
pub struct ArgoCdApiClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl std::fmt::Debug for ArgoCdApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArgoCdApiClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl ArgoCdApiClient {
    /// Create a client for `base_url` (`http(s)://host[:port]`)
    pub fn new(base_url: String, token: String) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("argodiff/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Create from the run configuration
    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(config.argocd_base_url(), config.argocd_token.clone())
    }

    fn applications_url(&self) -> String {
        format!("{}/api/v1/applications", self.base_url)
    }
}

#[async_trait]
impl ApplicationSource for ArgoCdApiClient {
    async fn list_applications(&self) -> Result<Vec<Application>> {
        let url = self.applications_url();
        info!("Fetching apps from: {}", url);

        let response = self
            .client
            .get(&url)
            .header("Cookie", format!("argocd.token={}", self.token))
            .send()
            .await
            .map_err(|e| Error::ArgoCd(format!("Applications request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::ArgoCd(format!(
                "Applications request returned {}",
                status
            )));
        }

        let list: ApplicationList = response
            .json()
            .await
            .map_err(|e| Error::ArgoCd(format!("Failed to parse applications response: {}", e)))?;

        Ok(list.items.unwrap_or_default())
    }
}
