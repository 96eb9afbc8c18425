//! Controller-specific error types and classification.
//!
//! Every failed reconcile carries exactly one of these errors, wrapped with
//! the phase it failed in. The classification drives both the requeue
//! decision and the reason recorded on the Ready condition.

use ocm_client::OcmError;
use thiserror::Error;

/// Errors that can occur in the identity provider controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// OCM API error
    #[error("OCM error: {0}")]
    Ocm(#[from] OcmError),

    /// Spec failed validation
    #[error("invalid resource: {0}")]
    InvalidResource(#[from] crds::ValidationError),

    /// Invalid controller configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Dispatched resource carries no metadata.name
    #[error("resource is missing metadata.name")]
    MissingName,

    /// Cluster association key does not look like an OCM external cluster ID
    #[error("malformed cluster key '{0}': expected 'xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx'")]
    MalformedClusterKey(String),

    /// No cluster with the given association key exists in OCM
    #[error("cluster '{0}' not found in OCM")]
    ClusterNotFound(String),

    /// Cluster exists but does not accept identity provider changes yet
    #[error("cluster '{name}' is not ready for identity providers (state: {state})")]
    ClusterNotReady {
        /// Cluster association key
        name: String,
        /// Reported lifecycle state
        state: String,
    },

    /// Referenced secret is absent or lacks the expected data key
    #[error("secret '{name}' is missing or lacks key '{key}'")]
    MissingSecret {
        /// Secret name
        name: String,
        /// Expected data key
        key: &'static str,
    },

    /// Referenced CA config map is absent or lacks the expected data key
    #[error("config map '{name}' is missing or lacks key '{key}'")]
    MissingCABundle {
        /// ConfigMap name
        name: String,
        /// Expected data key
        key: &'static str,
    },

    /// A pipeline phase failed
    #[error("phase {phase} failed: {source}")]
    Phase {
        /// Name of the failing phase
        phase: &'static str,
        /// Underlying failure
        #[source]
        source: Box<ControllerError>,
    },

    /// A pipeline phase panicked; never allowed to escape unclassified
    #[error("phase {phase} aborted unexpectedly: {detail}")]
    PhaseAborted {
        /// Name of the aborting phase
        phase: &'static str,
        /// Panic payload, if printable
        detail: String,
    },

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),
}

/// Coarse error classification driving the requeue decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Programming or wiring defect; logged, surfaced, not retried
    Internal,

    /// Bad user-supplied configuration; bounded requeue so a later
    /// correction (e.g. the secret being created) is picked up
    Configuration,

    /// External hiccup; retried with backoff
    Transient,

    /// Semantic rejection by the remote; requires external correction,
    /// retried at the normal periodic interval
    Permanent,
}

impl ControllerError {
    /// Classify the error for scheduling and condition reporting.
    pub fn classify(&self) -> ErrorClass {
        match self {
            Self::Phase { source, .. } => source.classify(),
            // Write conflicts and API hiccups both resolve by re-reading
            Self::Kube(_) => ErrorClass::Transient,
            Self::Ocm(e) => {
                if e.is_transient() {
                    ErrorClass::Transient
                } else {
                    ErrorClass::Permanent
                }
            }
            Self::ClusterNotFound(_) | Self::ClusterNotReady { .. } => ErrorClass::Transient,
            Self::InvalidResource(_)
            | Self::MalformedClusterKey(_)
            | Self::MissingSecret { .. }
            | Self::MissingCABundle { .. } => ErrorClass::Configuration,
            Self::InvalidConfig(_)
            | Self::MissingName
            | Self::PhaseAborted { .. }
            | Self::Watch(_) => ErrorClass::Internal,
        }
    }

    /// Machine-readable reason recorded on the Ready condition.
    pub fn condition_reason(&self) -> &'static str {
        match self {
            Self::Phase { source, .. } => source.condition_reason(),
            Self::Kube(_) => "KubernetesRequestFailed",
            Self::Ocm(e) => {
                if e.is_transient() {
                    "RemoteRequestFailed"
                } else {
                    "RemoteRejected"
                }
            }
            Self::InvalidResource(_) => "InvalidSpec",
            Self::MalformedClusterKey(_) => "MalformedClusterKey",
            Self::ClusterNotFound(_) => "ClusterNotFound",
            Self::ClusterNotReady { .. } => "ClusterNotReady",
            Self::MissingSecret { .. } => "MissingSecret",
            Self::MissingCABundle { .. } => "MissingCABundle",
            Self::InvalidConfig(_) | Self::MissingName | Self::PhaseAborted { .. } | Self::Watch(_) => {
                "InternalError"
            }
        }
    }

    /// Attribute the error to the phase it failed in. Already-attributed
    /// errors are left untouched.
    pub fn with_phase(self, phase: &'static str) -> Self {
        match self {
            Self::Phase { .. } | Self::PhaseAborted { .. } => self,
            other => Self::Phase {
                phase,
                source: Box::new(other),
            },
        }
    }
}
