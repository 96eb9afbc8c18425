//! Mock OcmClient for unit testing
//!
//! In-memory implementation of OcmClientTrait. Stores clusters and identity
//! providers in hash maps and counts write operations so tests can assert
//! that a reconcile produced no redundant remote writes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::OcmError;
use crate::models::{Cluster, IdentityProvider};
use crate::ocm_trait::OcmClientTrait;

/// Mock OCM client for testing
#[derive(Clone)]
pub struct MockOcmClient {
    base_url: String,
    // Clusters keyed by external cluster key
    clusters: Arc<Mutex<HashMap<String, Cluster>>>,
    // Identity providers keyed by cluster ID
    providers: Arc<Mutex<HashMap<String, Vec<IdentityProvider>>>>,
    next_id: Arc<Mutex<u64>>,
    writes: Arc<Mutex<u64>>,
}

impl MockOcmClient {
    /// Create a new mock client
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            clusters: Arc::new(Mutex::new(HashMap::new())),
            providers: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(Mutex::new(1)),
            writes: Arc::new(Mutex::new(0)),
        }
    }

    /// Add a cluster to the mock store (for test setup)
    pub fn add_cluster(&self, cluster: Cluster) {
        self.clusters
            .lock()
            .unwrap()
            .insert(cluster.external_id.clone(), cluster);
    }

    /// Add an identity provider to the mock store (for test setup)
    pub fn add_identity_provider(&self, cluster_id: &str, provider: IdentityProvider) {
        self.providers
            .lock()
            .unwrap()
            .entry(cluster_id.to_string())
            .or_default()
            .push(provider);
    }

    /// Number of write operations (create/update/delete) performed
    pub fn write_count(&self) -> u64 {
        *self.writes.lock().unwrap()
    }

    /// Identity providers currently attached to a cluster
    pub fn providers_on(&self, cluster_id: &str) -> Vec<IdentityProvider> {
        self.providers
            .lock()
            .unwrap()
            .get(cluster_id)
            .cloned()
            .unwrap_or_default()
    }

    fn next_id(&self) -> String {
        let mut id = self.next_id.lock().unwrap();
        let current = *id;
        *id += 1;
        format!("idp-{current}")
    }

    fn record_write(&self) {
        *self.writes.lock().unwrap() += 1;
    }

    // The real API never returns the client secret on reads.
    fn sanitize(mut provider: IdentityProvider) -> IdentityProvider {
        if let Some(gitlab) = provider.gitlab.as_mut() {
            gitlab.client_secret = None;
        }
        provider
    }
}

#[async_trait::async_trait]
impl OcmClientTrait for MockOcmClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn validate_token(&self) -> Result<(), OcmError> {
        Ok(())
    }

    async fn get_cluster_by_key(&self, key: &str) -> Result<Option<Cluster>, OcmError> {
        Ok(self.clusters.lock().unwrap().get(key).cloned())
    }

    async fn get_identity_provider(
        &self,
        cluster_id: &str,
        provider_id: &str,
    ) -> Result<IdentityProvider, OcmError> {
        self.providers
            .lock()
            .unwrap()
            .get(cluster_id)
            .and_then(|list| list.iter().find(|p| p.id.as_deref() == Some(provider_id)))
            .cloned()
            .map(Self::sanitize)
            .ok_or_else(|| {
                OcmError::NotFound(format!(
                    "identity provider {provider_id} on cluster {cluster_id}"
                ))
            })
    }

    async fn find_identity_provider_by_name(
        &self,
        cluster_id: &str,
        name: &str,
    ) -> Result<Option<IdentityProvider>, OcmError> {
        Ok(self
            .providers
            .lock()
            .unwrap()
            .get(cluster_id)
            .and_then(|list| list.iter().find(|p| p.name == name))
            .cloned()
            .map(Self::sanitize))
    }

    async fn create_identity_provider(
        &self,
        cluster_id: &str,
        provider: &IdentityProvider,
    ) -> Result<IdentityProvider, OcmError> {
        let mut providers = self.providers.lock().unwrap();
        let list = providers.entry(cluster_id.to_string()).or_default();

        if list.iter().any(|p| p.name == provider.name) {
            return Err(OcmError::InvalidRequest(format!(
                "identity provider '{}' already exists on cluster {cluster_id}",
                provider.name
            )));
        }

        let mut created = provider.clone();
        created.id = Some(self.next_id());
        list.push(created.clone());
        self.record_write();

        Ok(Self::sanitize(created))
    }

    async fn update_identity_provider(
        &self,
        cluster_id: &str,
        provider_id: &str,
        provider: &IdentityProvider,
    ) -> Result<IdentityProvider, OcmError> {
        let mut providers = self.providers.lock().unwrap();
        let list = providers.entry(cluster_id.to_string()).or_default();

        let existing = list
            .iter_mut()
            .find(|p| p.id.as_deref() == Some(provider_id))
            .ok_or_else(|| {
                OcmError::NotFound(format!(
                    "identity provider {provider_id} on cluster {cluster_id}"
                ))
            })?;

        let mut updated = provider.clone();
        updated.id = Some(provider_id.to_string());
        *existing = updated.clone();
        self.record_write();

        Ok(Self::sanitize(updated))
    }

    async fn delete_identity_provider(
        &self,
        cluster_id: &str,
        provider_id: &str,
    ) -> Result<(), OcmError> {
        let mut providers = self.providers.lock().unwrap();
        let list = providers.entry(cluster_id.to_string()).or_default();

        let before = list.len();
        list.retain(|p| p.id.as_deref() != Some(provider_id));
        if list.len() == before {
            return Err(OcmError::NotFound(format!(
                "identity provider {provider_id} on cluster {cluster_id}"
            )));
        }

        self.record_write();
        Ok(())
    }
}
