//! Shared fixtures for unit tests.

use crds::{
    GitLabIdentityProvider, GitLabIdentityProviderSpec, MappingMethod, SecretNameReference,
};
use kube::api::ObjectMeta;
use ocm_client::{Cluster, ClusterDns, ClusterState};

/// Well-formed cluster association key used across tests
pub const TEST_CLUSTER_KEY: &str = "abcd1234-ab12-cd34-ef56-abcdef123456";

/// OCM-internal ID of the test cluster
pub const TEST_CLUSTER_ID: &str = "1a2b3c4d5e";

pub fn test_provider(name: &str) -> GitLabIdentityProvider {
    GitLabIdentityProvider {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some("default".to_string()),
            ..Default::default()
        },
        spec: GitLabIdentityProviderSpec {
            client_id: "gitlab-oauth-app".to_string(),
            client_secret: SecretNameReference::new("gitlab-oauth"),
            url: "https://gitlab.example.com".to_string(),
            ca: None,
            mapping_method: MappingMethod::Claim,
            cluster_name: TEST_CLUSTER_KEY.to_string(),
            display_name: None,
        },
        status: None,
    }
}

pub fn test_cluster(state: ClusterState) -> Cluster {
    Cluster {
        id: TEST_CLUSTER_ID.to_string(),
        name: "prod-east".to_string(),
        external_id: TEST_CLUSTER_KEY.to_string(),
        state,
        dns: Some(ClusterDns {
            base_domain: "prod-east.example.com".to_string(),
        }),
    }
}
