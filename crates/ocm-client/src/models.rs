//! OCM API models
//!
//! These models match the OCM clusters_mgmt v1 resource representations.
//! Only the fields the controllers consume are modeled; unknown fields are
//! ignored on deserialization.

use serde::{Deserialize, Serialize};

/// OCM list envelope (paged collection responses)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ObjectList<T> {
    pub page: u32,
    pub size: u32,
    pub total: u32,
    #[serde(default)]
    pub items: Vec<T>,
}

/// Managed cluster as represented by clusters_mgmt
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Cluster {
    /// Internal cluster ID used in API paths
    pub id: String,
    /// Cluster display name
    pub name: String,
    /// External cluster ID ('xxxxxxxx-xxxx-...' format)
    #[serde(default)]
    pub external_id: String,
    /// Installation/lifecycle state
    pub state: ClusterState,
    /// DNS settings; carries the base domain the cluster's routes hang off
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns: Option<ClusterDns>,
}

/// Cluster DNS settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ClusterDns {
    #[serde(default)]
    pub base_domain: String,
}

/// Cluster lifecycle state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClusterState {
    Error,
    Hibernating,
    Installing,
    Pending,
    PoweringDown,
    Ready,
    Resuming,
    Uninstalling,
    Validating,
    Waiting,
    /// States this client does not model explicitly
    #[serde(other)]
    Unknown,
}

impl Cluster {
    /// Whether the cluster accepts identity provider changes
    pub fn is_ready(&self) -> bool {
        self.state == ClusterState::Ready
    }

    /// Base DNS domain, if the cluster reports one
    pub fn base_domain(&self) -> Option<&str> {
        self.dns
            .as_ref()
            .map(|dns| dns.base_domain.as_str())
            .filter(|domain| !domain.is_empty())
    }
}

/// Identity provider attached to a cluster
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct IdentityProvider {
    /// Remote-assigned ID; absent on create requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Display name of the provider
    pub name: String,
    /// Provider flavor discriminator
    #[serde(rename = "type")]
    pub provider_type: IdentityProviderType,
    /// Identity-to-user mapping method
    pub mapping_method: MappingMethod,
    /// GitLab-specific settings; present iff `provider_type` is GitLab
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gitlab: Option<GitLabSettings>,
}

/// Identity provider flavor
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum IdentityProviderType {
    #[serde(rename = "GitlabIdentityProvider")]
    GitLab,
    /// Flavors this client does not manage
    #[serde(other)]
    Unsupported,
}

/// Identity mapping method (API values are lowercase)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MappingMethod {
    #[default]
    Claim,
    Lookup,
    Generate,
    Add,
}

/// GitLab provider settings
///
/// `client_secret` is write-only on the API: it is sent on create/update and
/// never returned on reads. Comparisons between observed and desired state
/// must not include it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GitLabSettings {
    /// OAuth server base URL
    pub url: String,
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret (write-only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    /// PEM-encoded CA bundle trust anchor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca: Option<String>,
}
