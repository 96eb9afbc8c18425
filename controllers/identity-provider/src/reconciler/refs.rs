//! Secret and config-map reference resolution.
//!
//! The client secret and optional CA bundle are resolved inside the Apply
//! step, never earlier: a missing or malformed reference is a fatal
//! configuration error for this reconcile and the identity provider must
//! not be honored, but a bounded requeue still picks up a later correction.

use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::Api;

use crate::error::ControllerError;
use crate::request::IdentityProviderRequest;
use crds::{CA_BUNDLE_KEY, CLIENT_SECRET_KEY};

/// Reference data resolved for one Apply step
#[derive(Debug, Clone)]
pub struct ResolvedReferences {
    /// Plaintext OAuth client secret
    pub client_secret: String,
    /// PEM-encoded CA bundle, when a CA reference is declared
    pub ca_bundle: Option<String>,
}

/// Extract the client secret from a (possibly absent) Secret.
fn client_secret_from(secret: Option<Secret>, name: &str) -> Result<String, ControllerError> {
    let missing = || ControllerError::MissingSecret {
        name: name.to_string(),
        key: CLIENT_SECRET_KEY,
    };

    let data = secret.and_then(|s| s.data).ok_or_else(missing)?;
    let bytes = data.get(CLIENT_SECRET_KEY).ok_or_else(missing)?;

    String::from_utf8(bytes.0.clone()).map_err(|_| missing())
}

/// Extract the CA bundle from a (possibly absent) ConfigMap.
fn ca_bundle_from(config_map: Option<ConfigMap>, name: &str) -> Result<String, ControllerError> {
    let missing = || ControllerError::MissingCABundle {
        name: name.to_string(),
        key: CA_BUNDLE_KEY,
    };

    let data = config_map.and_then(|cm| cm.data).ok_or_else(missing)?;
    let pem = data.get(CA_BUNDLE_KEY).ok_or_else(missing)?;

    if pem.is_empty() {
        return Err(missing());
    }

    Ok(pem.clone())
}

/// Resolve the references declared on the resource spec.
pub async fn resolve(req: &IdentityProviderRequest) -> Result<ResolvedReferences, ControllerError> {
    let namespace = req.namespace().to_string();

    let secret_name = req.object.spec.client_secret.name.clone();
    let secrets: Api<Secret> = Api::namespaced(req.context.client.clone(), &namespace);
    let secret = secrets.get_opt(&secret_name).await?;
    let client_secret = client_secret_from(secret, &secret_name)?;

    let ca_bundle = match &req.object.spec.ca {
        Some(reference) if !reference.name.is_empty() => {
            let config_maps: Api<ConfigMap> =
                Api::namespaced(req.context.client.clone(), &namespace);
            let config_map = config_maps.get_opt(&reference.name).await?;
            Some(ca_bundle_from(config_map, &reference.name)?)
        }
        _ => None,
    };

    Ok(ResolvedReferences {
        client_secret,
        ca_bundle,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::ByteString;
    use std::collections::BTreeMap;

    fn secret_with(key: &str, value: &[u8]) -> Secret {
        Secret {
            data: Some(BTreeMap::from([(
                key.to_string(),
                ByteString(value.to_vec()),
            )])),
            ..Default::default()
        }
    }

    fn config_map_with(key: &str, value: &str) -> ConfigMap {
        ConfigMap {
            data: Some(BTreeMap::from([(key.to_string(), value.to_string())])),
            ..Default::default()
        }
    }

    #[test]
    fn test_client_secret_resolves_expected_key() {
        let secret = secret_with(CLIENT_SECRET_KEY, b"s3cr3t");

        let value = client_secret_from(Some(secret), "gitlab-oauth").unwrap();

        assert_eq!(value, "s3cr3t");
    }

    #[test]
    fn test_absent_secret_is_fatal_configuration_error() {
        let result = client_secret_from(None, "gitlab-oauth");

        assert!(matches!(
            result,
            Err(ControllerError::MissingSecret { key: CLIENT_SECRET_KEY, .. })
        ));
    }

    #[test]
    fn test_secret_without_expected_key_is_rejected() {
        let secret = secret_with("password", b"s3cr3t");

        let result = client_secret_from(Some(secret), "gitlab-oauth");

        assert!(matches!(result, Err(ControllerError::MissingSecret { .. })));
    }

    #[test]
    fn test_non_utf8_secret_is_rejected() {
        let secret = secret_with(CLIENT_SECRET_KEY, &[0xff, 0xfe]);

        let result = client_secret_from(Some(secret), "gitlab-oauth");

        assert!(matches!(result, Err(ControllerError::MissingSecret { .. })));
    }

    #[test]
    fn test_ca_bundle_resolves_expected_key() {
        let cm = config_map_with(CA_BUNDLE_KEY, "-----BEGIN CERTIFICATE-----");

        let pem = ca_bundle_from(Some(cm), "gitlab-ca").unwrap();

        assert!(pem.starts_with("-----BEGIN CERTIFICATE-----"));
    }

    #[test]
    fn test_absent_config_map_is_fatal_configuration_error() {
        let result = ca_bundle_from(None, "gitlab-ca");

        assert!(matches!(
            result,
            Err(ControllerError::MissingCABundle { key: CA_BUNDLE_KEY, .. })
        ));
    }

    #[test]
    fn test_empty_ca_data_is_rejected() {
        let cm = config_map_with(CA_BUNDLE_KEY, "");

        let result = ca_bundle_from(Some(cm), "gitlab-ca");

        assert!(matches!(result, Err(ControllerError::MissingCABundle { .. })));
    }
}
