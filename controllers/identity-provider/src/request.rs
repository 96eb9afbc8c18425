//! Request envelope and controller context.
//!
//! One envelope exists per reconcile invocation. It owns the freshly-read
//! resource, a snapshot of that resource as originally read (used to detect
//! no-op status writes), the classified trigger, per-invocation scratch
//! state shared between phases, and a reference back to the controller's
//! dependencies. It is created at the start of a reconcile call and
//! discarded at the end; never persisted, never shared across invocations.

use kube::api::{Patch, PatchParams};
use kube::{Api, Client, Resource};
use kube_runtime::events::{Event, EventType, Recorder};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::backoff::RetryTracker;
use crate::error::ControllerError;
use crate::triggers::Trigger;
use crds::{GitLabIdentityProvider, GitLabIdentityProviderStatus};
use ocm_client::{Cluster, IdentityProvider, OcmClientTrait};

/// Dependencies shared by every reconcile invocation
pub struct Context {
    /// Kubernetes client
    pub client: Client,
    /// OCM clusters-management client
    pub ocm: Box<dyn OcmClientTrait>,
    /// Kubernetes event recorder
    pub recorder: Recorder,
    /// Periodic resync interval for converged resources
    pub interval: Duration,
    /// Per-resource retry backoff state
    pub retries: RetryTracker,
}

/// Envelope around one delivered reconcile event
pub struct IdentityProviderRequest {
    /// The resource being converged; phases mutate this copy
    pub object: GitLabIdentityProvider,
    /// Snapshot taken as originally read, for no-op write detection
    pub original: GitLabIdentityProvider,
    /// Classification of this delivery
    pub trigger: Trigger,
    /// Namespaced API handle for the resource
    pub api: Api<GitLabIdentityProvider>,
    /// Owning controller dependencies
    pub context: Arc<Context>,

    // Per-invocation scratch shared between phases
    /// Upstream cluster resolved by the cluster phase
    pub cluster: Option<Cluster>,
    /// Remote provider observed by the fetch phase
    pub current: Option<IdentityProvider>,
}

impl IdentityProviderRequest {
    /// Wrap a freshly-read resource into an envelope.
    pub fn new(
        object: GitLabIdentityProvider,
        api: Api<GitLabIdentityProvider>,
        context: Arc<Context>,
    ) -> Self {
        let trigger = Trigger::classify(&object);
        Self {
            original: object.clone(),
            object,
            trigger,
            api,
            context,
            cluster: None,
            current: None,
        }
    }

    /// Resource name; a resource without one is a wiring defect.
    pub fn name(&self) -> Result<&str, ControllerError> {
        self.object
            .metadata
            .name
            .as_deref()
            .ok_or(ControllerError::MissingName)
    }

    /// Resource namespace, defaulting like the rest of the stack
    pub fn namespace(&self) -> &str {
        self.object.metadata.namespace.as_deref().unwrap_or("default")
    }

    /// `namespace/name` key used for logging and retry tracking
    pub fn resource_key(&self) -> String {
        format!(
            "{}/{}",
            self.namespace(),
            self.object.metadata.name.as_deref().unwrap_or("")
        )
    }

    /// Mutable status, initialized on first touch
    pub fn status_mut(&mut self) -> &mut GitLabIdentityProviderStatus {
        self.object
            .status
            .get_or_insert_with(GitLabIdentityProviderStatus::default)
    }

    /// Persist status if (and only if) it differs from the snapshot taken
    /// when the resource was read. Returns whether a write happened. The
    /// snapshot is advanced on success so repeated calls within one
    /// invocation stay no-ops.
    pub async fn persist_status(&mut self) -> Result<bool, ControllerError> {
        let current = self.object.status.clone().unwrap_or_default();
        let previous = self.original.status.clone().unwrap_or_default();
        if current == previous {
            return Ok(false);
        }

        let name = self.name()?.to_string();
        let patch = serde_json::json!({ "status": &current });
        self.api
            .patch_status(&name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;

        self.original.status = Some(current);
        Ok(true)
    }

    /// Publish a Kubernetes event for this resource. Event delivery is
    /// best-effort: failures are logged and never fail the reconcile.
    pub async fn record_event(&self, type_: EventType, reason: &str, note: String) {
        let reference = self.object.object_ref(&());
        let event = Event {
            type_,
            reason: reason.to_string(),
            note: Some(note),
            action: "Reconcile".to_string(),
            secondary: None,
        };

        if let Err(e) = self.context.recorder.publish(&event, &reference).await {
            warn!(
                "Failed to publish {} event for {}: {}",
                reason,
                self.resource_key(),
                e
            );
        }
    }
}
