pub mod endpoints;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::error::{PortalError, Result};
use crate::types::PageOptions;

pub use endpoints::ListEndpoint;

/// HTTP client wrapper for the admin REST API.
#[derive(Debug, Clone)]
pub struct PortalHttpClient {
    client: Client,
    base_url: String,
}

impl PortalHttpClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// GET a JSON resource.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(PortalError::Http {
                status,
                message: body,
            });
        }

        resp.json::<T>().await.map_err(PortalError::Request)
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// A remote paginated list: one call per page, wire-format JSON back.
#[async_trait]
pub trait ListSource: Send + Sync {
    async fn fetch_page(&self, options: &PageOptions) -> Result<serde_json::Value>;
}
