//! Kubernetes resource watch loop.
//!
//! Runs the reconcile loop on `kube_runtime::Controller`, which provides
//! the guarantees the reconciliation core relies on: at most one in-flight
//! reconcile per resource key, at-least-once delivery with automatic
//! reconnection, and periodic resync via the returned Action.

use futures::StreamExt;
use kube::Api;
use kube_runtime::{
    Controller, watcher,
    controller::{Action, Config as ControllerConfig},
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::error::ControllerError;
use crate::reconciler;
use crate::request::Context;
use crate::requeue;
use crds::GitLabIdentityProvider;

/// Watch GitLabIdentityProvider resources until shutdown.
pub async fn run(ctx: Arc<Context>, namespace: Option<String>) -> Result<(), ControllerError> {
    let api: Api<GitLabIdentityProvider> = match namespace.as_deref() {
        Some(ns) => Api::namespaced(ctx.client.clone(), ns),
        None => Api::all(ctx.client.clone()),
    };

    info!("Starting GitLabIdentityProvider watcher");

    // Error policy: the requeue classifier decides the retry cadence from
    // the error class, with per-resource backoff for transient failures.
    let error_policy = |obj: Arc<GitLabIdentityProvider>,
                        error: &ControllerError,
                        ctx: Arc<Context>|
     -> Action {
        let key = format!(
            "{}/{}",
            obj.metadata.namespace.as_deref().unwrap_or("default"),
            obj.metadata.name.as_deref().unwrap_or("")
        );
        error!("Reconciliation error for {}: {}", key, error);
        requeue::on_error(error, ctx.interval, ctx.retries.next_delay(&key))
    };

    // Debounce batches bursts of status updates; the concurrency cap bounds
    // simultaneous reconciles across resource keys.
    let controller_config = ControllerConfig::default()
        .debounce(Duration::from_secs(5))
        .concurrency(3);

    Controller::new(api, watcher::Config::default())
        .with_config(controller_config)
        .run(reconciler::reconcile, error_policy, ctx)
        .for_each(|result| async move {
            match result {
                Ok((obj, action)) => {
                    debug!("Reconciled {:?} -> {:?}", obj, action);
                }
                Err(e) => {
                    error!("Controller error: {}", e);
                }
            }
        })
        .await;

    Ok(())
}
