//! Unit tests for the identity provider convergence phases

use crate::error::ControllerError;
use crate::reconciler::identity_provider::{
    build_desired, callback_url, converge, merge_identifier, needs_update, teardown,
};
use crate::reconciler::refs::ResolvedReferences;
use crate::reconciler::{converge_phases, teardown_phases};
use crate::test_utils::{TEST_CLUSTER_ID, test_provider};
use ocm_client::{
    IdentityProviderType, MappingMethod, MockOcmClient, OcmClientTrait, OcmError,
};

fn resolved() -> ResolvedReferences {
    ResolvedReferences {
        client_secret: "s3cr3t".to_string(),
        ca_bundle: None,
    }
}

#[test]
fn test_build_desired_maps_spec_fields() {
    let mut resource = test_provider("gitlab");
    resource.spec.display_name = Some("corp-gitlab".to_string());
    let references = ResolvedReferences {
        client_secret: "s3cr3t".to_string(),
        ca_bundle: Some("-----BEGIN CERTIFICATE-----".to_string()),
    };

    let desired = build_desired(&resource, &references);

    assert_eq!(desired.name, "corp-gitlab");
    assert_eq!(desired.provider_type, IdentityProviderType::GitLab);
    assert_eq!(desired.mapping_method, MappingMethod::Claim);
    let gitlab = desired.gitlab.unwrap();
    assert_eq!(gitlab.url, "https://gitlab.example.com");
    assert_eq!(gitlab.client_id, "gitlab-oauth-app");
    assert_eq!(gitlab.client_secret.as_deref(), Some("s3cr3t"));
    assert_eq!(gitlab.ca.as_deref(), Some("-----BEGIN CERTIFICATE-----"));
}

#[test]
fn test_build_desired_uses_metadata_name_fallback() {
    let resource = test_provider("gitlab");

    let desired = build_desired(&resource, &resolved());

    assert_eq!(desired.name, "gitlab");
}

#[test]
fn test_needs_update_ignores_write_only_client_secret() {
    let resource = test_provider("gitlab");
    let desired = build_desired(&resource, &resolved());

    // A fresh read never carries the secret
    let mut observed = desired.clone();
    observed.id = Some("idp-1".to_string());
    observed.gitlab.as_mut().unwrap().client_secret = None;

    assert!(!needs_update(&observed, &desired));
}

#[test]
fn test_needs_update_detects_spec_drift() {
    let resource = test_provider("gitlab");
    let desired = build_desired(&resource, &resolved());

    let mut observed = desired.clone();
    observed.gitlab.as_mut().unwrap().url = "https://old-gitlab.example.com".to_string();
    assert!(needs_update(&observed, &desired));

    let mut observed = desired.clone();
    observed.mapping_method = MappingMethod::Lookup;
    assert!(needs_update(&observed, &desired));

    let mut observed = desired.clone();
    observed.gitlab.as_mut().unwrap().ca = Some("stale".to_string());
    assert!(needs_update(&observed, &desired));
}

#[test]
fn test_callback_url_derivation() {
    assert_eq!(
        callback_url("prod-east.example.com", "gitlab"),
        "https://oauth-openshift.apps.prod-east.example.com/oauth2callback/gitlab"
    );
}

#[test]
fn test_merge_identifier_takes_first_value() {
    let mut stored = String::new();

    assert!(!merge_identifier(&mut stored, "idp-1"));
    assert_eq!(stored, "idp-1");
}

#[test]
fn test_merge_identifier_keeps_stored_value_on_conflict() {
    let mut stored = "idp-1".to_string();

    let conflicted = merge_identifier(&mut stored, "idp-2");

    assert!(conflicted);
    assert_eq!(stored, "idp-1");
}

#[test]
fn test_merge_identifier_matching_value_is_clean() {
    let mut stored = "idp-1".to_string();

    assert!(!merge_identifier(&mut stored, "idp-1"));
    assert_eq!(stored, "idp-1");
}

#[tokio::test]
async fn test_converge_creates_when_absent() {
    let mock = MockOcmClient::new("http://test-ocm");
    let desired = build_desired(&test_provider("gitlab"), &resolved());

    let (converged, wrote) = converge(&mock, TEST_CLUSTER_ID, None, &desired)
        .await
        .unwrap();

    assert!(wrote);
    assert!(converged.id.is_some());
    assert_eq!(mock.write_count(), 1);
}

#[tokio::test]
async fn test_converge_twice_without_drift_writes_once() {
    let mock = MockOcmClient::new("http://test-ocm");
    let desired = build_desired(&test_provider("gitlab"), &resolved());

    // First pass creates
    converge(&mock, TEST_CLUSTER_ID, None, &desired).await.unwrap();
    assert_eq!(mock.write_count(), 1);

    // Second pass observes the fresh remote read and stays hands-off
    let observed = mock
        .find_identity_provider_by_name(TEST_CLUSTER_ID, "gitlab")
        .await
        .unwrap();
    let (_, wrote) = converge(&mock, TEST_CLUSTER_ID, observed.as_ref(), &desired)
        .await
        .unwrap();

    assert!(!wrote);
    assert_eq!(mock.write_count(), 1);
}

#[tokio::test]
async fn test_converge_updates_on_drift() {
    let mock = MockOcmClient::new("http://test-ocm");
    let resource = test_provider("gitlab");
    let desired = build_desired(&resource, &resolved());
    converge(&mock, TEST_CLUSTER_ID, None, &desired).await.unwrap();

    let observed = mock
        .find_identity_provider_by_name(TEST_CLUSTER_ID, "gitlab")
        .await
        .unwrap();
    let mut resource = resource;
    resource.spec.url = "https://gitlab.corp.example.com".to_string();
    let desired = build_desired(&resource, &resolved());

    let (converged, wrote) = converge(&mock, TEST_CLUSTER_ID, observed.as_ref(), &desired)
        .await
        .unwrap();

    assert!(wrote);
    assert_eq!(converged.gitlab.unwrap().url, "https://gitlab.corp.example.com");
    assert_eq!(mock.write_count(), 2);
}

#[tokio::test]
async fn test_converge_adopts_existing_on_create_race() {
    let mock = MockOcmClient::new("http://test-ocm");
    let desired = build_desired(&test_provider("gitlab"), &resolved());
    // A concurrent reconcile already created the provider
    mock.create_identity_provider(TEST_CLUSTER_ID, &desired)
        .await
        .unwrap();

    let (converged, wrote) = converge(&mock, TEST_CLUSTER_ID, None, &desired)
        .await
        .unwrap();

    assert!(!wrote);
    assert!(converged.id.is_some());
    assert_eq!(mock.write_count(), 1);
}

#[tokio::test]
async fn test_converge_propagates_remote_errors() {
    let mock = MockOcmClient::new("http://test-ocm");
    let desired = build_desired(&test_provider("gitlab"), &resolved());

    let mut observed = desired.clone();
    observed.id = None; // an observed object without an id is not actionable
    observed.gitlab.as_mut().unwrap().url = "https://old.example.com".to_string();

    let result = converge(&mock, TEST_CLUSTER_ID, Some(&observed), &desired).await;

    assert!(matches!(
        result,
        Err(ControllerError::Ocm(OcmError::InvalidRequest(_)))
    ));
}

#[tokio::test]
async fn test_teardown_by_known_id() {
    let mock = MockOcmClient::new("http://test-ocm");
    let desired = build_desired(&test_provider("gitlab"), &resolved());
    let created = mock
        .create_identity_provider(TEST_CLUSTER_ID, &desired)
        .await
        .unwrap();
    let id = created.id.unwrap();

    let deleted = teardown(&mock, TEST_CLUSTER_ID, Some(&id), "gitlab")
        .await
        .unwrap();

    assert!(deleted);
    assert!(mock.providers_on(TEST_CLUSTER_ID).is_empty());
}

#[tokio::test]
async fn test_teardown_by_name_when_id_unknown() {
    let mock = MockOcmClient::new("http://test-ocm");
    let desired = build_desired(&test_provider("gitlab"), &resolved());
    mock.create_identity_provider(TEST_CLUSTER_ID, &desired)
        .await
        .unwrap();

    let deleted = teardown(&mock, TEST_CLUSTER_ID, None, "gitlab").await.unwrap();

    assert!(deleted);
    assert!(mock.providers_on(TEST_CLUSTER_ID).is_empty());
}

#[tokio::test]
async fn test_teardown_of_absent_provider_is_converged() {
    let mock = MockOcmClient::new("http://test-ocm");

    // Deleted before the first successful reconcile: nothing to tear down
    let deleted = teardown(&mock, TEST_CLUSTER_ID, None, "gitlab").await.unwrap();

    assert!(!deleted);
    assert_eq!(mock.write_count(), 0);
}

#[tokio::test]
async fn test_teardown_is_idempotent() {
    let mock = MockOcmClient::new("http://test-ocm");
    let desired = build_desired(&test_provider("gitlab"), &resolved());
    let created = mock
        .create_identity_provider(TEST_CLUSTER_ID, &desired)
        .await
        .unwrap();
    let id = created.id.unwrap();

    assert!(teardown(&mock, TEST_CLUSTER_ID, Some(&id), "gitlab").await.unwrap());
    // The redelivered Delete finds nothing left and reports convergence
    assert!(!teardown(&mock, TEST_CLUSTER_ID, Some(&id), "gitlab").await.unwrap());
}

#[test]
fn test_converge_pipeline_phase_order() {
    assert_eq!(
        converge_phases().phase_names(),
        vec![
            "HandleUpstreamCluster",
            "GetCurrentState",
            "ApplyIdentityProvider",
            "Complete",
        ]
    );
}

#[test]
fn test_teardown_pipeline_releases_finalizer_last() {
    // Finalizer removal must never run before teardown has succeeded; the
    // pipeline short-circuits on failure, so ordering is the guarantee.
    assert_eq!(teardown_phases().phase_names(), vec!["Destroy", "CompleteDestroy"]);
}
