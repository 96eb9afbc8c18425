//! References to collaborating Kubernetes objects
//!
//! Secret and ConfigMap references used by the identity provider CRDs.
//! These are name-only references: the referenced object is expected to
//! live in the same namespace as the referencing resource.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Reference to a Secret by name (same namespace as the referencing resource)
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SecretNameReference {
    /// Name of the referenced Secret
    pub name: String,
}

/// Reference to a ConfigMap by name (same namespace as the referencing resource)
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMapNameReference {
    /// Name of the referenced ConfigMap
    pub name: String,
}

impl SecretNameReference {
    /// Create a reference to a secret by name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl ConfigMapNameReference {
    /// Create a reference to a config map by name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
