//! OCM API client
//!
//! Implements the OCM clusters-management REST client used by the identity
//! provider controller. API structure: /api/clusters_mgmt/v1/clusters and
//! /api/clusters_mgmt/v1/clusters/{id}/identity_providers.

use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::debug;

use crate::error::OcmError;
use crate::models::{Cluster, IdentityProvider, ObjectList};
use crate::ocm_trait::OcmClientTrait;

const CLUSTERS_MGMT_PATH: &str = "/api/clusters_mgmt/v1";

// A cluster carries at most a handful of identity providers; a single
// generously-sized page covers the collection without pagination.
const LIST_PAGE_SIZE: u32 = 100;

/// OCM API client
pub struct OcmClient {
    client: Client,
    base_url: String,
    token: String,
}

impl OcmClient {
    /// Create a new OCM client
    ///
    /// # Arguments
    /// * `base_url` - OCM base URL (e.g. "https://api.openshift.com")
    /// * `token` - bearer token for authentication
    pub fn new(base_url: String, token: String) -> Result<Self, OcmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(OcmError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/json")
    }

    /// Map a non-success response to the matching error variant.
    async fn error_for(response: Response, context: &str) -> OcmError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                OcmError::Authentication(format!("{context}: {status} - {body}"))
            }
            StatusCode::NOT_FOUND => OcmError::NotFound(context.to_string()),
            StatusCode::BAD_REQUEST => OcmError::InvalidRequest(format!("{context}: {body}")),
            _ => OcmError::Api {
                status: status.as_u16(),
                message: format!("{context}: {body}"),
            },
        }
    }
}

#[async_trait::async_trait]
impl OcmClientTrait for OcmClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Validate the bearer token by fetching the clusters_mgmt metadata
    /// document. This is lightweight and requires authentication.
    async fn validate_token(&self) -> Result<(), OcmError> {
        let url = format!("{}{}", self.base_url, CLUSTERS_MGMT_PATH);
        debug!("Validating OCM token and connectivity");

        let response = self
            .request(reqwest::Method::GET, &url)
            .send()
            .await
            .map_err(OcmError::Http)?;

        if !response.status().is_success() {
            return Err(Self::error_for(response, "validate token").await);
        }

        debug!("Token validated successfully");
        Ok(())
    }

    async fn get_cluster_by_key(&self, key: &str) -> Result<Option<Cluster>, OcmError> {
        let search = urlencoding::encode(&format!("external_id = '{key}'")).into_owned();
        let url = format!(
            "{}{}/clusters?search={}&size=1",
            self.base_url, CLUSTERS_MGMT_PATH, search
        );
        debug!("Looking up cluster with key {} in OCM", key);

        let response = self
            .request(reqwest::Method::GET, &url)
            .send()
            .await
            .map_err(OcmError::Http)?;

        if !response.status().is_success() {
            return Err(Self::error_for(response, &format!("lookup cluster {key}")).await);
        }

        let list: ObjectList<Cluster> = response.json().await?;
        Ok(list.items.into_iter().next())
    }

    async fn get_identity_provider(
        &self,
        cluster_id: &str,
        provider_id: &str,
    ) -> Result<IdentityProvider, OcmError> {
        let url = format!(
            "{}{}/clusters/{}/identity_providers/{}",
            self.base_url, CLUSTERS_MGMT_PATH, cluster_id, provider_id
        );
        debug!("Fetching identity provider {} on cluster {}", provider_id, cluster_id);

        let response = self
            .request(reqwest::Method::GET, &url)
            .send()
            .await
            .map_err(OcmError::Http)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(OcmError::NotFound(format!(
                "identity provider {provider_id} on cluster {cluster_id}"
            )));
        }

        if !response.status().is_success() {
            return Err(
                Self::error_for(response, &format!("get identity provider {provider_id}")).await,
            );
        }

        let provider: IdentityProvider = response.json().await?;
        Ok(provider)
    }

    async fn find_identity_provider_by_name(
        &self,
        cluster_id: &str,
        name: &str,
    ) -> Result<Option<IdentityProvider>, OcmError> {
        let url = format!(
            "{}{}/clusters/{}/identity_providers?size={}",
            self.base_url, CLUSTERS_MGMT_PATH, cluster_id, LIST_PAGE_SIZE
        );
        debug!("Searching identity provider '{}' on cluster {}", name, cluster_id);

        let response = self
            .request(reqwest::Method::GET, &url)
            .send()
            .await
            .map_err(OcmError::Http)?;

        if !response.status().is_success() {
            return Err(Self::error_for(
                response,
                &format!("list identity providers on cluster {cluster_id}"),
            )
            .await);
        }

        let list: ObjectList<IdentityProvider> = response.json().await?;
        Ok(list.items.into_iter().find(|p| p.name == name))
    }

    async fn create_identity_provider(
        &self,
        cluster_id: &str,
        provider: &IdentityProvider,
    ) -> Result<IdentityProvider, OcmError> {
        let url = format!(
            "{}{}/clusters/{}/identity_providers",
            self.base_url, CLUSTERS_MGMT_PATH, cluster_id
        );
        debug!("Creating identity provider '{}' on cluster {}", provider.name, cluster_id);

        let response = self
            .request(reqwest::Method::POST, &url)
            .json(provider)
            .send()
            .await
            .map_err(OcmError::Http)?;

        if !response.status().is_success() {
            return Err(Self::error_for(
                response,
                &format!("create identity provider '{}'", provider.name),
            )
            .await);
        }

        let created: IdentityProvider = response.json().await?;
        Ok(created)
    }

    async fn update_identity_provider(
        &self,
        cluster_id: &str,
        provider_id: &str,
        provider: &IdentityProvider,
    ) -> Result<IdentityProvider, OcmError> {
        let url = format!(
            "{}{}/clusters/{}/identity_providers/{}",
            self.base_url, CLUSTERS_MGMT_PATH, cluster_id, provider_id
        );
        debug!("Updating identity provider {} on cluster {}", provider_id, cluster_id);

        let response = self
            .request(reqwest::Method::PATCH, &url)
            .json(provider)
            .send()
            .await
            .map_err(OcmError::Http)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(OcmError::NotFound(format!(
                "identity provider {provider_id} on cluster {cluster_id}"
            )));
        }

        if !response.status().is_success() {
            return Err(
                Self::error_for(response, &format!("update identity provider {provider_id}"))
                    .await,
            );
        }

        let updated: IdentityProvider = response.json().await?;
        Ok(updated)
    }

    async fn delete_identity_provider(
        &self,
        cluster_id: &str,
        provider_id: &str,
    ) -> Result<(), OcmError> {
        let url = format!(
            "{}{}/clusters/{}/identity_providers/{}",
            self.base_url, CLUSTERS_MGMT_PATH, cluster_id, provider_id
        );
        debug!("Deleting identity provider {} on cluster {}", provider_id, cluster_id);

        let response = self
            .request(reqwest::Method::DELETE, &url)
            .send()
            .await
            .map_err(OcmError::Http)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(OcmError::NotFound(format!(
                "identity provider {provider_id} on cluster {cluster_id}"
            )));
        }

        if !response.status().is_success() {
            return Err(
                Self::error_for(response, &format!("delete identity provider {provider_id}"))
                    .await,
            );
        }

        Ok(())
    }
}
