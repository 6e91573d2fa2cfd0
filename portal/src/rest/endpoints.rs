use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::rest::{ListSource, PortalHttpClient};
use crate::types::PageOptions;

impl PortalHttpClient {
    /// GET `path` with `page`, `page_size`, `ordering`, `search` and any
    /// extra filters as query parameters. Returns the snake_case page body.
    pub async fn get_page(&self, path: &str, options: &PageOptions) -> Result<Value> {
        self.get(path, &options.to_request_query()).await
    }

    /// GET /enterprise/api/v1/enterprise-customer/{id}/unenrolled-registered-learners/
    pub async fn get_unenrolled_registered_learners(
        &self,
        enterprise_id: &str,
        options: &PageOptions,
    ) -> Result<Value> {
        self.get_page(&unenrolled_registered_learners_path(enterprise_id), options)
            .await
    }
}

fn unenrolled_registered_learners_path(enterprise_id: &str) -> String {
    format!("/enterprise/api/v1/enterprise-customer/{enterprise_id}/unenrolled-registered-learners/")
}

/// A list endpoint bound to one path, usable as a controller's [`ListSource`].
#[derive(Debug, Clone)]
pub struct ListEndpoint {
    client: PortalHttpClient,
    path: String,
}

impl ListEndpoint {
    pub fn new(client: PortalHttpClient, path: impl Into<String>) -> Self {
        Self {
            client,
            path: path.into(),
        }
    }

    pub fn unenrolled_registered_learners(client: PortalHttpClient, enterprise_id: &str) -> Self {
        Self::new(client, unenrolled_registered_learners_path(enterprise_id))
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

#[async_trait]
impl ListSource for ListEndpoint {
    async fn fetch_page(&self, options: &PageOptions) -> Result<Value> {
        self.client.get_page(&self.path, options).await
    }
}
