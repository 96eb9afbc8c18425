//! Finalizer management.
//!
//! The finalizer token blocks garbage collection of a resource while an
//! external side effect may exist. It is added before the first side effect
//! and removed only after teardown has reported success, so the Delete
//! pipeline runs to completion even across controller restarts.
//!
//! Persist conflicts (stale resource version) surface as retryable
//! Kubernetes errors; the caller requeues rather than aborting.

use kube::Api;
use kube::api::{Patch, PatchParams};
use tracing::debug;

use crate::error::ControllerError;
use crds::GitLabIdentityProvider;

/// Finalizer token owned by this controller
pub const FINALIZER: &str = "ocmops.microscaler.io/identity-provider-finalizer";

/// Whether the resource currently carries the finalizer token
pub fn has_finalizer(resource: &GitLabIdentityProvider) -> bool {
    resource
        .metadata
        .finalizers
        .as_ref()
        .is_some_and(|finalizers| finalizers.iter().any(|f| f == FINALIZER))
}

/// Finalizer list with the token appended (idempotent)
fn with_token(existing: Option<&Vec<String>>) -> Vec<String> {
    let mut finalizers = existing.cloned().unwrap_or_default();
    if !finalizers.iter().any(|f| f == FINALIZER) {
        finalizers.push(FINALIZER.to_string());
    }
    finalizers
}

/// Finalizer list with the token removed (idempotent)
fn without_token(existing: Option<&Vec<String>>) -> Vec<String> {
    existing
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .filter(|f| f != FINALIZER)
        .collect()
}

async fn persist_finalizers(
    api: &Api<GitLabIdentityProvider>,
    resource: &GitLabIdentityProvider,
    finalizers: Vec<String>,
) -> Result<(), ControllerError> {
    let name = resource
        .metadata
        .name
        .as_deref()
        .ok_or(ControllerError::MissingName)?;

    let patch = serde_json::json!({
        "metadata": {
            "finalizers": finalizers,
        }
    });

    api.patch(name, &PatchParams::default(), &Patch::Merge(&patch))
        .await?;

    Ok(())
}

/// Idempotently ensure the finalizer token is present, persisting only when
/// it was absent.
pub async fn ensure(
    api: &Api<GitLabIdentityProvider>,
    resource: &mut GitLabIdentityProvider,
) -> Result<(), ControllerError> {
    if has_finalizer(resource) {
        return Ok(());
    }

    let finalizers = with_token(resource.metadata.finalizers.as_ref());
    persist_finalizers(api, resource, finalizers.clone()).await?;
    resource.metadata.finalizers = Some(finalizers);

    debug!(
        "Added finalizer to GitLabIdentityProvider {}/{}",
        resource.metadata.namespace.as_deref().unwrap_or("default"),
        resource.metadata.name.as_deref().unwrap_or("")
    );
    Ok(())
}

/// Idempotently remove the finalizer token, persisting only when it was
/// present. Must only be invoked after all external teardown has reported
/// success.
pub async fn remove(
    api: &Api<GitLabIdentityProvider>,
    resource: &mut GitLabIdentityProvider,
) -> Result<(), ControllerError> {
    if !has_finalizer(resource) {
        return Ok(());
    }

    let finalizers = without_token(resource.metadata.finalizers.as_ref());
    persist_finalizers(api, resource, finalizers.clone()).await?;
    resource.metadata.finalizers = Some(finalizers);

    debug!(
        "Removed finalizer from GitLabIdentityProvider {}/{}",
        resource.metadata.namespace.as_deref().unwrap_or("default"),
        resource.metadata.name.as_deref().unwrap_or("")
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_token_appends_once() {
        let finalizers = with_token(None);
        assert_eq!(finalizers, vec![FINALIZER.to_string()]);

        let again = with_token(Some(&finalizers));
        assert_eq!(again.len(), 1);
    }

    #[test]
    fn test_with_token_preserves_foreign_tokens() {
        let existing = vec!["other.io/finalizer".to_string()];
        let finalizers = with_token(Some(&existing));

        assert_eq!(finalizers.len(), 2);
        assert_eq!(finalizers[0], "other.io/finalizer");
        assert_eq!(finalizers[1], FINALIZER);
    }

    #[test]
    fn test_without_token_removes_only_ours() {
        let existing = vec!["other.io/finalizer".to_string(), FINALIZER.to_string()];
        let finalizers = without_token(Some(&existing));

        assert_eq!(finalizers, vec!["other.io/finalizer".to_string()]);
    }

    #[test]
    fn test_without_token_on_empty_list() {
        assert!(without_token(None).is_empty());
    }
}
