//! Main controller implementation.
//!
//! Wires the Kubernetes client, the OCM client and the event recorder into
//! the shared context and runs the watch loop until shutdown.

use kube::Client;
use kube_runtime::events::{Recorder, Reporter};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::backoff::RetryTracker;
use crate::error::ControllerError;
use crate::request::Context;
use crate::watcher;
use ocm_client::{OcmClient, OcmClientTrait};

const REPORTER: &str = "identity-provider-controller";

/// Controller converging GitLabIdentityProvider resources against OCM.
pub struct Controller {
    watcher: JoinHandle<Result<(), ControllerError>>,
}

impl Controller {
    /// Creates a new controller instance.
    pub async fn new(
        ocm_url: String,
        ocm_token: String,
        namespace: Option<String>,
        interval: Duration,
    ) -> Result<Self, ControllerError> {
        info!("Initializing OCM Identity Provider Controller");

        // Create Kubernetes client
        let kube_client = Client::try_default().await?;

        // Create OCM client
        let ocm_client = OcmClient::new(ocm_url.clone(), ocm_token)?;

        // Validate token and connectivity before proceeding
        info!("Validating OCM token and connectivity...");
        ocm_client.validate_token().await.map_err(|e| {
            error!("Failed to validate OCM token: {}", e);
            error!("Please ensure:");
            error!("  1. OCM_TOKEN environment variable is set correctly");
            error!("  2. The token has not expired");
            error!("  3. OCM is reachable at {}", ocm_url);
            ControllerError::Ocm(e)
        })?;
        info!("OCM token validated and connectivity established");

        let recorder = Recorder::new(
            kube_client.clone(),
            Reporter {
                controller: REPORTER.to_string(),
                instance: None,
            },
        );

        let ctx = Arc::new(Context {
            client: kube_client,
            ocm: Box::new(ocm_client),
            recorder,
            interval,
            retries: RetryTracker::default(),
        });

        let watcher = tokio::spawn(watcher::run(ctx, namespace));

        Ok(Self { watcher })
    }

    /// Runs the controller until shutdown.
    pub async fn run(self) -> Result<(), ControllerError> {
        info!("OCM Identity Provider Controller running");

        self.watcher
            .await
            .map_err(|e| {
                ControllerError::Watch(format!("GitLabIdentityProvider watcher panicked: {e}"))
            })?
            .map_err(|e| {
                ControllerError::Watch(format!("GitLabIdentityProvider watcher error: {e}"))
            })?;

        Ok(())
    }
}
