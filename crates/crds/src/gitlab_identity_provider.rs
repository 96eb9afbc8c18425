//! GitLabIdentityProvider CRD
//!
//! Declares a GitLab OAuth identity provider to be attached to an OpenShift
//! cluster managed through OpenShift Cluster Manager (OCM).

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::conditions::Condition;
use crate::references::{ConfigMapNameReference, SecretNameReference};
use crate::workload::Workload;

/// Data key holding the OAuth client secret in the referenced Secret
pub const CLIENT_SECRET_KEY: &str = "clientSecret";

/// Data key reserved for a GitLab API access token. No controller phase
/// consumes this yet; the key name is fixed here so existing secrets keep
/// working once the capability lands.
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Data key holding the PEM-encoded CA bundle in the referenced ConfigMap
pub const CA_BUNDLE_KEY: &str = "ca.crt";

/// Maximum length of `metadata.name`. The name propagates into the remote
/// display name when `displayName` is unset, and the backend API caps
/// display names at 15 characters.
pub const MAX_NAME_LENGTH: usize = 15;

/// Display name length bounds imposed by the backend API
pub const DISPLAY_NAME_MIN_LENGTH: usize = 4;
/// Upper display name length bound
pub const DISPLAY_NAME_MAX_LENGTH: usize = 15;

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "ocmops.microscaler.io",
    version = "v1alpha1",
    kind = "GitLabIdentityProvider",
    namespaced,
    status = "GitLabIdentityProviderStatus",
    shortname = "glidp"
)]
#[serde(rename_all = "camelCase")]
pub struct GitLabIdentityProviderSpec {
    /// OAuth client ID of the GitLab application
    #[serde(rename = "clientID")]
    pub client_id: String,

    /// Reference to the Secret holding the OAuth client secret under the
    /// key "clientSecret". If the secret or expected key is not found, the
    /// identity provider is not honored.
    pub client_secret: SecretNameReference,

    /// OAuth server base URL (e.g. "https://gitlab.example.com")
    pub url: String,

    /// Optional reference to a ConfigMap holding a PEM-encoded CA bundle
    /// under the key "ca.crt", used as the trust anchor for the TLS
    /// certificate presented by the GitLab server. If specified and the
    /// config map or expected key is not found, the identity provider is
    /// not honored. If empty, the default system roots are used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca: Option<ConfigMapNameReference>,

    /// Mapping method controlling how identities map to cluster users.
    /// One of claim (default), lookup, generate, or add.
    #[serde(default)]
    pub mapping_method: MappingMethod,

    /// Cluster association key in OpenShift Cluster Manager (the cluster's
    /// 'External ID': 'xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx'). Immutable
    /// after first write.
    pub cluster_name: String,

    /// Friendly display name shown in the OpenShift Cluster Manager
    /// console, 4 to 15 characters. If empty, metadata.name of the parent
    /// resource is used. Immutable after first write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Identity mapping method
///
/// Serializes lowercase to match the upstream OCM API values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MappingMethod {
    /// Provision a user with the identity's preferred username; fail on clash
    #[default]
    Claim,

    /// Look up an existing identity mapping; never provision
    Lookup,

    /// Provision a user, generating a unique username on clash
    Generate,

    /// Add the identity to an existing user with the same username
    Add,
}

impl MappingMethod {
    /// Lowercase API value of the mapping method
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Claim => "claim",
            Self::Lookup => "lookup",
            Self::Generate => "generate",
            Self::Add => "add",
        }
    }
}

/// Observed state written by the controller.
///
/// The identifier fields are immutable once set to a non-empty value: later
/// reconciles must never overwrite them with a different value. This guards
/// against a transient remote lookup returning a different-but-valid object.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GitLabIdentityProviderStatus {
    /// Status conditions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    /// Programmatic OCM cluster ID resolved from the cluster association
    /// key. Stored to avoid re-resolving on every reconcile. Immutable
    /// once non-empty.
    #[serde(default, skip_serializing_if = "String::is_empty", rename = "clusterID")]
    pub cluster_id: String,

    /// Programmatic OCM identity provider ID. Immutable once non-empty.
    #[serde(default, skip_serializing_if = "String::is_empty", rename = "providerID")]
    pub provider_id: String,

    /// OAuth callback endpoint the external provider must be configured
    /// with. Immutable once non-empty.
    #[serde(default, skip_serializing_if = "String::is_empty", rename = "callbackURL")]
    pub callback_url: String,
}

/// Spec-level validation failures
#[derive(Debug, Error)]
pub enum ValidationError {
    /// metadata.name exceeds the backend display name limit
    #[error("metadata.name '{0}' exceeds {MAX_NAME_LENGTH} characters")]
    NameTooLong(String),

    /// metadata.name missing entirely
    #[error("metadata.name is required")]
    MissingName,

    /// displayName outside the 4..=15 character bounds
    #[error("displayName '{0}' must be {DISPLAY_NAME_MIN_LENGTH} to {DISPLAY_NAME_MAX_LENGTH} characters")]
    DisplayNameLength(String),

    /// clusterName missing
    #[error("clusterName is required")]
    MissingClusterName,
}

impl GitLabIdentityProvider {
    /// Display name used for the remote object: `spec.displayName` when
    /// set, otherwise `metadata.name`.
    pub fn display_name(&self) -> String {
        match &self.spec.display_name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => self.metadata.name.clone().unwrap_or_default(),
        }
    }

    /// Validate the fields admission cannot express for this resource.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let name = self
            .metadata
            .name
            .as_deref()
            .ok_or(ValidationError::MissingName)?;
        if name.len() > MAX_NAME_LENGTH {
            return Err(ValidationError::NameTooLong(name.to_string()));
        }

        if let Some(display_name) = &self.spec.display_name {
            if display_name.len() < DISPLAY_NAME_MIN_LENGTH
                || display_name.len() > DISPLAY_NAME_MAX_LENGTH
            {
                return Err(ValidationError::DisplayNameLength(display_name.clone()));
            }
        }

        if self.spec.cluster_name.is_empty() {
            return Err(ValidationError::MissingClusterName);
        }

        Ok(())
    }
}

impl Workload for GitLabIdentityProvider {
    fn get_cluster_name(&self) -> &str {
        &self.spec.cluster_name
    }

    fn get_cluster_id(&self) -> &str {
        self.status.as_ref().map_or("", |s| s.cluster_id.as_str())
    }

    fn get_conditions(&self) -> &[Condition] {
        self.status.as_ref().map_or(&[], |s| s.conditions.as_slice())
    }

    fn set_conditions(&mut self, conditions: Vec<Condition>) {
        self.status
            .get_or_insert_with(GitLabIdentityProviderStatus::default)
            .conditions = conditions;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::api::ObjectMeta;

    fn provider(name: &str, display_name: Option<&str>) -> GitLabIdentityProvider {
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
                mapping_method: MappingMethod::default(),
                cluster_name: "abcd1234-ab12-cd34-ef56-abcdef123456".to_string(),
                display_name: display_name.map(String::from),
            },
            status: None,
        }
    }

    #[test]
    fn test_display_name_prefers_spec() {
        let idp = provider("gitlab", Some("corp-gitlab"));
        assert_eq!(idp.display_name(), "corp-gitlab");
    }

    #[test]
    fn test_display_name_falls_back_to_metadata_name() {
        let idp = provider("gitlab", None);
        assert_eq!(idp.display_name(), "gitlab");
    }

    #[test]
    fn test_validate_accepts_well_formed_spec() {
        assert!(provider("gitlab", Some("corp-gitlab")).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_long_name() {
        let idp = provider("a-very-long-resource-name", None);
        assert!(matches!(idp.validate(), Err(ValidationError::NameTooLong(_))));
    }

    #[test]
    fn test_validate_rejects_short_display_name() {
        let idp = provider("gitlab", Some("gl"));
        assert!(matches!(
            idp.validate(),
            Err(ValidationError::DisplayNameLength(_))
        ));
    }

    #[test]
    fn test_validate_rejects_empty_cluster_name() {
        let mut idp = provider("gitlab", None);
        idp.spec.cluster_name = String::new();
        assert!(matches!(
            idp.validate(),
            Err(ValidationError::MissingClusterName)
        ));
    }

    #[test]
    fn test_mapping_method_defaults_to_claim() {
        let spec: GitLabIdentityProviderSpec = serde_json::from_value(serde_json::json!({
            "clientID": "gitlab-oauth-app",
            "clientSecret": {"name": "gitlab-oauth"},
            "url": "https://gitlab.example.com",
            "clusterName": "abcd1234-ab12-cd34-ef56-abcdef123456",
        }))
        .unwrap();

        assert_eq!(spec.mapping_method, MappingMethod::Claim);
    }

    #[test]
    fn test_mapping_method_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(MappingMethod::Lookup).unwrap(),
            serde_json::json!("lookup")
        );
    }

    #[test]
    fn test_workload_cluster_id_empty_without_status() {
        let idp = provider("gitlab", None);
        assert_eq!(idp.get_cluster_id(), "");
        assert!(idp.get_conditions().is_empty());
    }

    #[test]
    fn test_status_skips_empty_identifiers() {
        let status = GitLabIdentityProviderStatus::default();
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value, serde_json::json!({}));
    }
}
