//! OCM Identity Provider Controller
//!
//! Watches GitLabIdentityProvider custom resources and converges the
//! OpenShift Cluster Manager API toward the declared state: resolving the
//! upstream cluster, upserting the identity provider, recording the
//! remote-assigned identifiers in status and tearing the provider down on
//! deletion behind a finalizer.

mod backoff;
mod controller;
mod error;
mod finalizer;
mod phases;
mod reconciler;
mod request;
mod requeue;
mod triggers;
mod watcher;

#[cfg(test)]
mod test_utils;

use controller::Controller;
use error::ControllerError;
use std::env;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt::init();

    info!("Starting OCM Identity Provider Controller");

    // Load configuration from environment variables
    let ocm_url = env::var("OCM_URL").unwrap_or_else(|_| "https://api.openshift.com".to_string());
    let ocm_token = env::var("OCM_TOKEN").map_err(|_| {
        ControllerError::InvalidConfig("OCM_TOKEN environment variable is required".to_string())
    })?;
    let namespace = env::var("WATCH_NAMESPACE").ok();
    let interval = env::var("RECONCILE_INTERVAL_SECONDS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(requeue::DEFAULT_REQUEUE, Duration::from_secs);

    info!("Configuration:");
    info!("  OCM URL: {}", ocm_url);
    info!("  Namespace: {}", namespace.as_deref().unwrap_or("all namespaces"));
    info!("  Resync interval: {:?}", interval);

    // Initialize and run controller
    let controller = Controller::new(ocm_url, ocm_token, namespace, interval).await?;
    controller.run().await?;

    Ok(())
}
