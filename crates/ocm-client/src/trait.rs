//! OcmClient trait for mocking
//!
//! This trait abstracts the OcmClient to enable mocking in unit tests.
//! The concrete OcmClient implements this trait, and tests can use mock
//! implementations. All async methods must be `Send` to work with Tokio's
//! work-stealing runtime.

use crate::error::OcmError;
use crate::models::{Cluster, IdentityProvider};

/// Trait for OCM clusters-management API operations
#[async_trait::async_trait]
pub trait OcmClientTrait: Send + Sync {
    /// Get the base URL
    fn base_url(&self) -> &str;

    /// Validate the API token and connectivity
    async fn validate_token(&self) -> Result<(), OcmError>;

    /// Look up a cluster by its external cluster key
    async fn get_cluster_by_key(&self, key: &str) -> Result<Option<Cluster>, OcmError>;

    /// Get an identity provider by its remote-assigned ID
    async fn get_identity_provider(
        &self,
        cluster_id: &str,
        provider_id: &str,
    ) -> Result<IdentityProvider, OcmError>;

    /// Find an identity provider on a cluster by display name
    async fn find_identity_provider_by_name(
        &self,
        cluster_id: &str,
        name: &str,
    ) -> Result<Option<IdentityProvider>, OcmError>;

    /// Attach a new identity provider to a cluster
    async fn create_identity_provider(
        &self,
        cluster_id: &str,
        provider: &IdentityProvider,
    ) -> Result<IdentityProvider, OcmError>;

    /// Update an existing identity provider
    async fn update_identity_provider(
        &self,
        cluster_id: &str,
        provider_id: &str,
        provider: &IdentityProvider,
    ) -> Result<IdentityProvider, OcmError>;

    /// Detach an identity provider from a cluster
    async fn delete_identity_provider(
        &self,
        cluster_id: &str,
        provider_id: &str,
    ) -> Result<(), OcmError>;
}
