//! Trigger classification.
//!
//! Decides whether a delivered reconcile event represents a Create, Update
//! or Delete. The classification is pure: it inspects only the resource and
//! never calls an external API.

use crds::{GitLabIdentityProvider, Workload};

/// Classification of a reconcile event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// First convergence: no status identifier has been populated yet
    Create,

    /// Subsequent convergence of an already-bound resource
    Update,

    /// The resource carries a deletion marker; run teardown
    Delete,
}

impl Trigger {
    /// Classify a delivered resource.
    ///
    /// Delete wins whenever the deletion marker is set, irrespective of
    /// finalizer or status contents. A resource deleted before its first
    /// successful reconcile still routes to Delete, and teardown steps are
    /// no-ops when there is nothing to tear down.
    pub fn classify(resource: &GitLabIdentityProvider) -> Self {
        if resource.metadata.deletion_timestamp.is_some() {
            return Self::Delete;
        }

        if resource.get_cluster_id().is_empty() {
            Self::Create
        } else {
            Self::Update
        }
    }

    /// Human-readable trigger name for logging
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
        }
    }
}
