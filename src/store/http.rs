//! HTTP-backed store clients.
//!
//! Thin reqwest clients for deployments where the policy and descriptor
//! stores live behind a service. Timeouts, retries, and cancellation belong
//! here at the collaborator boundary, never in the core.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::StoreConfig;
use crate::lint::DescriptorAllowList;
use crate::policy::{Stage, StoredPolicy};
use crate::{Error, Result};

/// Shared HTTP client for store collaborators.
#[derive(Debug, Clone)]
pub struct StoreClient {
    base_url: String,
    client: reqwest::Client,
}

impl StoreClient {
    /// Create a new store client with the given base URL and timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("gatekeeper-engine/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Create a store client from the store section of the configuration.
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        Self::new(config.base_url.clone(), config.timeout())
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Perform a GET request, returning `None` on 404.
    async fn get_json<T: DeserializeOwned>(
        &self,
        store: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| Error::store(store, e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Error::store(
                store,
                format!("HTTP {} from {url}", response.status()),
            ));
        }
        response
            .json::<T>()
            .await
            .map(Some)
            .map_err(|e| Error::store(store, format!("failed to parse response: {e}")))
    }

    /// Check if the backing service is healthy.
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

/// Policy store served over HTTP.
pub struct HttpPolicyStore {
    client: StoreClient,
}

impl HttpPolicyStore {
    /// Create a policy store client.
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl super::PolicyStore for HttpPolicyStore {
    async fn fetch_policies_for_stage(
        &self,
        stage: Stage,
        policy_version: &str,
    ) -> Result<Vec<StoredPolicy>> {
        let rows: Option<Vec<StoredPolicy>> = self
            .client
            .get_json(
                "policy-store",
                "/v1/policies",
                &[("stage", stage.as_str()), ("version", policy_version)],
            )
            .await?;
        Ok(rows.unwrap_or_default())
    }
}

/// Descriptor store served over HTTP.
pub struct HttpDescriptorStore {
    client: StoreClient,
}

impl HttpDescriptorStore {
    /// Create a descriptor store client.
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl super::DescriptorStore for HttpDescriptorStore {
    async fn fetch_descriptor_paths(
        &self,
        tenant_id: &str,
        version: &str,
    ) -> Result<DescriptorAllowList> {
        let path = format!("/v1/descriptors/{tenant_id}/{version}/paths");
        let allowed: Option<DescriptorAllowList> = self
            .client
            .get_json("descriptor-store", &path, &[])
            .await?;
        // A missing descriptor is not an error; it means empty allow-lists.
        Ok(allowed.unwrap_or_else(DescriptorAllowList::empty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DescriptorStore, PolicyStore};
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> StoreClient {
        StoreClient::new(server.uri(), Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_policies() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/policies"))
            .and(query_param("stage", "pre_query"))
            .and(query_param("version", "v0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"content": {"name": "p1"}, "distilled_prompt": "", "priority": 10}
            ])))
            .mount(&server)
            .await;

        let store = HttpPolicyStore::new(client(&server));
        let rows = store
            .fetch_policies_for_stage(Stage::PreQuery, "v0")
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].priority, 10);
    }

    #[tokio::test]
    async fn test_fetch_policies_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/policies"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let store = HttpPolicyStore::new(client(&server));
        let err = store
            .fetch_policies_for_stage(Stage::PreQuery, "v0")
            .await
            .unwrap_err();
        assert_eq!(err.category(), "store");
    }

    #[tokio::test]
    async fn test_fetch_descriptor_paths() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/descriptors/tenant-1/v2/paths"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "user": ["role", "department"],
                "doc.metadata": ["tags"]
            })))
            .mount(&server)
            .await;

        let store = HttpDescriptorStore::new(client(&server));
        let allowed = store
            .fetch_descriptor_paths("tenant-1", "v2")
            .await
            .unwrap();
        assert!(allowed.user.contains("department"));
        assert!(allowed.doc_metadata.contains("tags"));
    }

    #[tokio::test]
    async fn test_missing_descriptor_is_empty_not_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let store = HttpDescriptorStore::new(client(&server));
        let allowed = store
            .fetch_descriptor_paths("tenant-1", "v0")
            .await
            .unwrap();
        assert_eq!(allowed, DescriptorAllowList::empty());
    }

    #[tokio::test]
    async fn test_client_from_config() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/policies"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let config = StoreConfig {
            base_url: format!("{}/", server.uri()),
            timeout_ms: 500,
        };
        let client = StoreClient::from_config(&config).unwrap();
        // Trailing slash is normalized away.
        assert_eq!(client.base_url(), server.uri());

        let store = HttpPolicyStore::new(client);
        let rows = store
            .fetch_policies_for_stage(Stage::PreQuery, "v0")
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        assert!(client(&server).health_check().await);
    }
}
