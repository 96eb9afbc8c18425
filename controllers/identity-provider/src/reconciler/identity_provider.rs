//! Identity provider convergence phases.
//!
//! Fetches the observed remote identity provider, builds the desired
//! representation from the spec, upserts the remote object, records the
//! remote-assigned identifiers, and tears the provider down on deletion.
//! Every step is check-before-act: re-running a phase with no external
//! drift produces no additional remote writes.

use futures::FutureExt;
use futures::future::BoxFuture;
use kube_runtime::events::EventType;
use tracing::{debug, info, warn};

use crate::error::ControllerError;
use crate::finalizer;
use crate::phases::{PhaseOutcome, PhaseResult};
use crate::reconciler::refs::{self, ResolvedReferences};
use crate::request::IdentityProviderRequest;
use crds::{
    Condition, ConditionStatus, GitLabIdentityProvider, IDENTIFIERS_CONDITION, READY_CONDITION,
    Workload, set_condition,
};
use ocm_client::{
    GitLabSettings, IdentityProvider, IdentityProviderType, MappingMethod, OcmClientTrait,
    OcmError,
};

fn to_remote_mapping(method: crds::MappingMethod) -> MappingMethod {
    match method {
        crds::MappingMethod::Claim => MappingMethod::Claim,
        crds::MappingMethod::Lookup => MappingMethod::Lookup,
        crds::MappingMethod::Generate => MappingMethod::Generate,
        crds::MappingMethod::Add => MappingMethod::Add,
    }
}

/// Build the desired remote representation from the spec and the resolved
/// secret/CA references.
pub(crate) fn build_desired(
    resource: &GitLabIdentityProvider,
    resolved: &ResolvedReferences,
) -> IdentityProvider {
    IdentityProvider {
        id: None,
        name: resource.display_name(),
        provider_type: IdentityProviderType::GitLab,
        mapping_method: to_remote_mapping(resource.spec.mapping_method),
        gitlab: Some(GitLabSettings {
            url: resource.spec.url.clone(),
            client_id: resource.spec.client_id.clone(),
            client_secret: Some(resolved.client_secret.clone()),
            ca: resolved.ca_bundle.clone(),
        }),
    }
}

/// Whether the observed remote object drifted from the desired one.
///
/// The client secret is write-only on the API and never part of the
/// comparison; an unchanged spec therefore compares equal against a fresh
/// read and produces no remote write.
pub(crate) fn needs_update(current: &IdentityProvider, desired: &IdentityProvider) -> bool {
    let (Some(current_gitlab), Some(desired_gitlab)) = (&current.gitlab, &desired.gitlab) else {
        return true;
    };

    current.name != desired.name
        || current.mapping_method != desired.mapping_method
        || current.provider_type != desired.provider_type
        || current_gitlab.url != desired_gitlab.url
        || current_gitlab.client_id != desired_gitlab.client_id
        || current_gitlab.ca != desired_gitlab.ca
}

/// OAuth callback endpoint served by the cluster for this provider.
pub(crate) fn callback_url(base_domain: &str, provider_name: &str) -> String {
    format!("https://oauth-openshift.apps.{base_domain}/oauth2callback/{provider_name}")
}

/// Immutability guard for status identifier fields.
///
/// An empty field takes the resolved value; a populated field is never
/// overwritten. Returns `true` when the resolved value conflicted with the
/// stored one.
pub(crate) fn merge_identifier(stored: &mut String, resolved: &str) -> bool {
    if stored.is_empty() {
        *stored = resolved.to_string();
        return false;
    }

    stored != resolved
}

/// Create or update the remote identity provider to match `desired`.
///
/// Returns the converged remote object and whether a remote write happened.
/// A create that races a concurrent reconcile adopts the existing object
/// instead of failing.
pub(crate) async fn converge(
    ocm: &dyn OcmClientTrait,
    cluster_id: &str,
    observed: Option<&IdentityProvider>,
    desired: &IdentityProvider,
) -> Result<(IdentityProvider, bool), ControllerError> {
    match observed {
        Some(current) if !needs_update(current, desired) => Ok((current.clone(), false)),
        Some(current) => {
            let id = current.id.as_deref().ok_or_else(|| {
                ControllerError::Ocm(OcmError::InvalidRequest(
                    "observed identity provider carries no id".to_string(),
                ))
            })?;
            let updated = ocm.update_identity_provider(cluster_id, id, desired).await?;
            Ok((updated, true))
        }
        None => match ocm.create_identity_provider(cluster_id, desired).await {
            Ok(created) => Ok((created, true)),
            Err(OcmError::InvalidRequest(message)) if message.contains("already exists") => {
                warn!(
                    "Create of identity provider '{}' reported an existing object, adopting it",
                    desired.name
                );
                let existing = ocm
                    .find_identity_provider_by_name(cluster_id, &desired.name)
                    .await?
                    .ok_or(ControllerError::Ocm(OcmError::InvalidRequest(message)))?;
                Ok((existing, false))
            }
            Err(e) => Err(e.into()),
        },
    }
}

/// Delete the remote identity provider if it still exists.
///
/// Returns whether a delete happened. Remote absence is already-converged,
/// not an error; only on confirmed absence may the caller proceed to
/// finalizer removal.
pub(crate) async fn teardown(
    ocm: &dyn OcmClientTrait,
    cluster_id: &str,
    provider_id: Option<&str>,
    display_name: &str,
) -> Result<bool, ControllerError> {
    let target = match provider_id {
        Some(id) => Some(id.to_string()),
        None => ocm
            .find_identity_provider_by_name(cluster_id, display_name)
            .await?
            .and_then(|p| p.id),
    };

    let Some(id) = target else {
        return Ok(false);
    };

    match ocm.delete_identity_provider(cluster_id, &id).await {
        Ok(()) => Ok(true),
        Err(OcmError::NotFound(_)) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// GetCurrentState phase: query the remote API for the existing identity
/// provider, by remote-assigned ID when known, else by name. Absence is not
/// an error.
pub fn get_current_state(req: &mut IdentityProviderRequest) -> BoxFuture<'_, PhaseResult> {
    async move {
        let cluster_id = req.object.get_cluster_id().to_string();
        let provider_id = req
            .object
            .status
            .as_ref()
            .map(|s| s.provider_id.clone())
            .unwrap_or_default();

        let observed = if provider_id.is_empty() {
            req.context
                .ocm
                .find_identity_provider_by_name(&cluster_id, &req.object.display_name())
                .await?
        } else {
            match req
                .context
                .ocm
                .get_identity_provider(&cluster_id, &provider_id)
                .await
            {
                Ok(provider) => Some(provider),
                Err(OcmError::NotFound(_)) => {
                    warn!(
                        "Identity provider {} for {} no longer exists remotely, will recreate",
                        provider_id,
                        req.resource_key()
                    );
                    None
                }
                Err(e) => return Err(e.into()),
            }
        };

        req.current = observed;
        Ok(PhaseOutcome::Continue)
    }
    .boxed()
}

/// ApplyIdentityProvider phase: resolve references, build the desired
/// state, upsert the remote object and record the assigned identifiers.
pub fn apply(req: &mut IdentityProviderRequest) -> BoxFuture<'_, PhaseResult> {
    async move {
        // References resolve here, never earlier: a missing secret must
        // fail the reconcile before any remote call is attempted.
        let resolved = refs::resolve(req).await?;
        let desired = build_desired(&req.object, &resolved);
        let cluster_id = req.object.get_cluster_id().to_string();

        let created_new = req.current.is_none();
        let (converged, wrote) = converge(
            req.context.ocm.as_ref(),
            &cluster_id,
            req.current.as_ref(),
            &desired,
        )
        .await?;

        if wrote {
            info!(
                "{} identity provider '{}' on cluster {} for {}",
                if created_new { "Created" } else { "Updated" },
                desired.name,
                cluster_id,
                req.resource_key()
            );
        } else {
            debug!(
                "Identity provider '{}' on cluster {} already converged",
                desired.name, cluster_id
            );
        }

        // Remote-assigned identifiers are immutable once recorded.
        let mut conflicted = false;
        if let Some(id) = &converged.id {
            conflicted |= merge_identifier(&mut req.status_mut().provider_id, id);
        }
        let callback = req
            .cluster
            .as_ref()
            .and_then(|c| c.base_domain())
            .map(|domain| callback_url(domain, &desired.name));
        if let Some(callback) = callback {
            conflicted |= merge_identifier(&mut req.status_mut().callback_url, &callback);
        }

        if conflicted {
            warn!(
                "Remote identifiers for {} no longer match the stored status; keeping the stored values",
                req.resource_key()
            );
            let mut conditions = req.object.get_conditions().to_vec();
            set_condition(
                &mut conditions,
                Condition::new(
                    IDENTIFIERS_CONDITION,
                    ConditionStatus::False,
                    "ImmutableFieldConflict",
                    "remote lookup returned identifiers that differ from the stored status",
                ),
            );
            req.object.set_conditions(conditions);
        }

        req.persist_status().await?;

        if wrote && created_new {
            req.record_event(
                EventType::Normal,
                "CreatedIdentityProvider",
                format!("created identity provider '{}' on cluster {}", desired.name, cluster_id),
            )
            .await;
        }

        req.current = Some(converged);
        Ok(PhaseOutcome::Continue)
    }
    .boxed()
}

/// Complete phase: mark the resource Ready and persist status.
pub fn complete(req: &mut IdentityProviderRequest) -> BoxFuture<'_, PhaseResult> {
    async move {
        let mut conditions = req.object.get_conditions().to_vec();
        set_condition(
            &mut conditions,
            Condition::new(
                READY_CONDITION,
                ConditionStatus::True,
                "Reconciled",
                "identity provider reconciled",
            ),
        );
        req.object.set_conditions(conditions);
        req.persist_status().await?;

        info!(
            "Reconciliation of {} complete ({} trigger)",
            req.resource_key(),
            req.trigger.as_str()
        );
        Ok(PhaseOutcome::Continue)
    }
    .boxed()
}

/// Destroy phase: remove the remote identity provider. A resource deleted
/// before its first successful reconcile has nothing to tear down.
pub fn destroy(req: &mut IdentityProviderRequest) -> BoxFuture<'_, PhaseResult> {
    async move {
        let cluster_id = req.object.get_cluster_id().to_string();
        if cluster_id.is_empty() {
            debug!(
                "{} was never bound to a cluster, nothing to tear down",
                req.resource_key()
            );
            return Ok(PhaseOutcome::Continue);
        }

        let provider_id = req
            .object
            .status
            .as_ref()
            .map(|s| s.provider_id.clone())
            .unwrap_or_default();
        let display_name = req.object.display_name();

        let deleted = teardown(
            req.context.ocm.as_ref(),
            &cluster_id,
            (!provider_id.is_empty()).then_some(provider_id.as_str()),
            &display_name,
        )
        .await?;

        if deleted {
            info!(
                "Deleted identity provider for {} from cluster {}",
                req.resource_key(),
                cluster_id
            );
            req.record_event(
                EventType::Normal,
                "DeletedIdentityProvider",
                format!("deleted identity provider '{display_name}' from cluster {cluster_id}"),
            )
            .await;
        } else {
            debug!(
                "No remote identity provider left for {}, already converged",
                req.resource_key()
            );
        }

        Ok(PhaseOutcome::Continue)
    }
    .boxed()
}

/// CompleteDestroy phase: release the resource by removing the finalizer.
/// Runs only after Destroy has reported success.
pub fn complete_destroy(req: &mut IdentityProviderRequest) -> BoxFuture<'_, PhaseResult> {
    async move {
        finalizer::remove(&req.api, &mut req.object).await?;

        info!("Teardown of {} complete", req.resource_key());
        Ok(PhaseOutcome::Continue)
    }
    .boxed()
}
