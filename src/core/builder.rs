//! core::builder
//!
//! Assemble a local config entry from remote control plane objects.
//!
//! The builder performs no I/O; the resolver fetches everything first.
//! Credential fields are emitted only when the definition enables auth,
//! and never as empty placeholders.

use thiserror::Error;

use crate::api::{
    ControlPlaneDefinition, ControlPlaneInstance, KubernetesRuntimeDefinition,
    KubernetesRuntimeInstance,
};
use crate::core::config::{ControlPlaneConfigEntry, Credential};

/// Errors from building a config entry.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BuildError {
    #[error("control plane '{instance}' has auth enabled but the API returned no {field}")]
    MissingAuthMaterial {
        instance: String,
        field: &'static str,
    },
}

/// Build a config entry for `instance`.
///
/// `runtime_instance` is accepted for symmetry with the fetch sequence;
/// only its definition contributes a field.
pub fn build_entry(
    instance: &ControlPlaneInstance,
    definition: &ControlPlaneDefinition,
    _runtime_instance: &KubernetesRuntimeInstance,
    runtime_definition: &KubernetesRuntimeDefinition,
) -> Result<ControlPlaneConfigEntry, BuildError> {
    let mut entry = ControlPlaneConfigEntry {
        name: instance.name.clone(),
        api_server: instance.api_server_endpoint.clone(),
        auth_enabled: definition.auth_enabled,
        ca_cert: None,
        infra_provider: runtime_definition.infra_provider.clone(),
        genesis: instance.genesis.unwrap_or(false),
        credentials: None,
    };

    if definition.auth_enabled {
        let missing = |field| BuildError::MissingAuthMaterial {
            instance: instance.name.clone(),
            field,
        };
        let ca_cert = instance.ca_cert.clone().ok_or_else(|| missing("CA certificate"))?;
        let client_cert = instance
            .client_cert
            .clone()
            .ok_or_else(|| missing("client certificate"))?;
        let client_key = instance
            .client_key
            .clone()
            .ok_or_else(|| missing("client key"))?;

        entry.ca_cert = Some(ca_cert);
        entry.credentials = Some(vec![Credential {
            name: instance.name.clone(),
            client_cert,
            client_key,
        }]);
    }

    Ok(entry)
}
