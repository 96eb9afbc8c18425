//! Reconciliation dispatch.
//!
//! Wraps one delivered event into a request envelope, classifies the
//! trigger, runs the matching phase pipeline and maps the terminal outcome
//! into a scheduling decision. Every failed pipeline results in exactly one
//! Ready-condition update before the error is handed to the watch loop's
//! error policy.

pub mod cluster;
pub mod identity_provider;
pub mod refs;
#[cfg(test)]
mod identity_provider_test;

use kube::Api;
use kube_runtime::controller::Action;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::ControllerError;
use crate::finalizer;
use crate::phases::{Phase, Pipeline, PipelineOutcome};
use crate::request::{Context, IdentityProviderRequest};
use crate::requeue;
use crate::triggers::Trigger;
use crds::{Condition, ConditionStatus, GitLabIdentityProvider, READY_CONDITION, Workload, set_condition};

/// Phase list for Create and Update triggers. Create and update share
/// identical convergence logic; the trigger only changes readiness gating
/// and the final scheduling decision.
fn converge_phases() -> Pipeline<IdentityProviderRequest> {
    Pipeline::new(vec![
        Phase::new("HandleUpstreamCluster", cluster::handle_upstream_cluster),
        Phase::new("GetCurrentState", identity_provider::get_current_state),
        Phase::new("ApplyIdentityProvider", identity_provider::apply),
        Phase::new("Complete", identity_provider::complete),
    ])
}

/// Phase list for the Delete trigger. The finalizer is released only by the
/// terminal phase, after teardown has reported success.
fn teardown_phases() -> Pipeline<IdentityProviderRequest> {
    Pipeline::new(vec![
        Phase::new("Destroy", identity_provider::destroy),
        Phase::new("CompleteDestroy", identity_provider::complete_destroy),
    ])
}

async fn reconcile_converge(req: &mut IdentityProviderRequest) -> PipelineOutcome {
    if let Err(e) = req.object.validate() {
        return PipelineOutcome::Failed(ControllerError::from(e));
    }

    // The finalizer must be present before any external side effect.
    if let Err(e) = finalizer::ensure(&req.api, &mut req.object).await {
        return PipelineOutcome::Failed(e);
    }

    converge_phases().execute(req).await
}

async fn reconcile_delete(req: &mut IdentityProviderRequest) -> PipelineOutcome {
    teardown_phases().execute(req).await
}

/// Record a failed reconcile on the Ready condition. Exactly one condition
/// update happens per failure; the merge semantics keep a repeated failure
/// from churning the stored condition.
async fn record_failure(req: &mut IdentityProviderRequest, error: &ControllerError) {
    let mut conditions = req.object.get_conditions().to_vec();
    set_condition(
        &mut conditions,
        Condition::new(
            READY_CONDITION,
            ConditionStatus::False,
            error.condition_reason(),
            error.to_string(),
        ),
    );
    req.object.set_conditions(conditions);

    if let Err(patch_err) = req.persist_status().await {
        warn!(
            "Failed to record failure condition for {}: {}",
            req.resource_key(),
            patch_err
        );
    }
}

/// Reconcile one delivered event.
pub async fn reconcile(
    object: Arc<GitLabIdentityProvider>,
    ctx: Arc<Context>,
) -> Result<Action, ControllerError> {
    let name = object
        .metadata
        .name
        .clone()
        .ok_or(ControllerError::MissingName)?;
    let namespace = object
        .metadata
        .namespace
        .clone()
        .unwrap_or_else(|| "default".to_string());
    let api: Api<GitLabIdentityProvider> = Api::namespaced(ctx.client.clone(), &namespace);

    // Read fresh state: the copy delivered by the watch stream may lag a
    // previous invocation's writes.
    let Some(object) = api.get_opt(&name).await? else {
        debug!(
            "GitLabIdentityProvider {}/{} no longer exists, nothing to do",
            namespace, name
        );
        return Ok(Action::await_change());
    };

    let mut req = IdentityProviderRequest::new(object, api, ctx.clone());
    let key = req.resource_key();
    let trigger = req.trigger;
    info!("Reconciling GitLabIdentityProvider {} ({} trigger)", key, trigger.as_str());

    let outcome = match trigger {
        Trigger::Create | Trigger::Update => reconcile_converge(&mut req).await,
        Trigger::Delete => reconcile_delete(&mut req).await,
    };

    match outcome {
        PipelineOutcome::Done => {
            ctx.retries.reset(&key);
            Ok(requeue::on_done(trigger, ctx.interval))
        }
        PipelineOutcome::RequeueScheduled(delay) => {
            debug!("Requeueing {} after {:?}", key, delay);
            Ok(requeue::on_requeue(delay))
        }
        PipelineOutcome::Failed(err) => {
            error!("Reconciliation of {} failed: {}", key, err);
            record_failure(&mut req, &err).await;
            Err(err)
        }
    }
}
