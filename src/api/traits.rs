//! api::traits
//!
//! The remote topology contract and the objects it returns.
//!
//! # Design
//!
//! The trait is async because every call is network I/O. Calls are
//! independent and never retried here; retry policy, if any, belongs to
//! the transport. Callers issue them one at a time.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::config::ControlPlaneConfigEntry;

/// Errors from control plane API calls.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    /// The requested object does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The API rejected our credentials.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    Network(String),

    /// TLS material could not be loaded into a client.
    #[error("TLS configuration error: {0}")]
    Tls(String),

    /// The response body was not what we expected.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// A control plane instance as seen by the API.
///
/// Instances form a tree through `children`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ControlPlaneInstance {
    #[serde(rename = "ID", default)]
    pub id: Option<u64>,
    pub name: String,
    #[serde(rename = "ControlPlaneDefinitionID")]
    pub control_plane_definition_id: u64,
    #[serde(rename = "KubernetesRuntimeInstanceID")]
    pub kubernetes_runtime_instance_id: u64,
    #[serde(default)]
    pub api_server_endpoint: String,
    #[serde(rename = "CACert", default)]
    pub ca_cert: Option<String>,
    #[serde(rename = "Certificate", default)]
    pub client_cert: Option<String>,
    #[serde(rename = "CertificateKey", default)]
    pub client_key: Option<String>,
    #[serde(default)]
    pub genesis: Option<bool>,
    #[serde(default)]
    pub children: Vec<ControlPlaneInstance>,
}

/// Declarative configuration of a control plane.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ControlPlaneDefinition {
    #[serde(rename = "ID", default)]
    pub id: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub auth_enabled: bool,
}

/// The Kubernetes runtime a control plane runs on.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct KubernetesRuntimeInstance {
    #[serde(rename = "ID", default)]
    pub id: Option<u64>,
    pub name: String,
    #[serde(rename = "KubernetesRuntimeDefinitionID")]
    pub kubernetes_runtime_definition_id: u64,
}

/// Declarative configuration of a Kubernetes runtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct KubernetesRuntimeDefinition {
    #[serde(rename = "ID", default)]
    pub id: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub infra_provider: String,
}

/// TLS material for talking to an auth-enabled API.
#[derive(Clone, PartialEq)]
pub struct TlsMaterial {
    pub ca_cert: String,
    pub client_cert: String,
    pub client_key: String,
}

// Keep key material out of debug output
impl std::fmt::Debug for TlsMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsMaterial").finish_non_exhaustive()
    }
}

/// Where and how to reach one control plane's API.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiTarget {
    /// Base URL including scheme, without trailing slash
    pub base_url: String,
    /// Present when the API requires mutual TLS
    pub tls: Option<TlsMaterial>,
}

impl ApiTarget {
    /// Plain target with no TLS material.
    pub fn insecure(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(&base_url.into(), false),
            tls: None,
        }
    }

    /// Derive the target for a locally configured control plane.
    ///
    /// # Errors
    ///
    /// `ApiError::Tls` if auth is enabled but the entry lacks a CA
    /// certificate or credential.
    pub fn from_entry(entry: &ControlPlaneConfigEntry) -> Result<Self, ApiError> {
        let tls = if entry.auth_enabled {
            let ca_cert = entry.ca_cert.clone().ok_or_else(|| {
                ApiError::Tls(format!("control plane '{}' has no CA certificate", entry.name))
            })?;
            let credential = entry.credential().ok_or_else(|| {
                ApiError::Tls(format!("control plane '{}' has no credentials", entry.name))
            })?;
            Some(TlsMaterial {
                ca_cert,
                client_cert: credential.client_cert.clone(),
                client_key: credential.client_key.clone(),
            })
        } else {
            None
        };

        Ok(Self {
            base_url: normalize_base_url(&entry.api_server, entry.auth_enabled),
            tls,
        })
    }
}

/// Add a scheme if missing and drop trailing slashes.
fn normalize_base_url(address: &str, secure: bool) -> String {
    let trimmed = address.trim_end_matches('/');
    if trimmed.contains("://") {
        trimmed.to_string()
    } else if secure {
        format!("https://{}", trimmed)
    } else {
        format!("http://{}", trimmed)
    }
}

/// Read access to the remote control plane topology.
///
/// Every method is an independent remote call against `target`.
#[async_trait]
pub trait RemoteTopologyClient: Send + Sync {
    /// Fetch an instance by name, including its immediate `children`.
    async fn get_instance_by_name(
        &self,
        target: &ApiTarget,
        name: &str,
    ) -> Result<ControlPlaneInstance, ApiError>;

    /// Fetch a control plane definition by ID.
    async fn get_definition_by_id(
        &self,
        target: &ApiTarget,
        id: u64,
    ) -> Result<ControlPlaneDefinition, ApiError>;

    /// Fetch a Kubernetes runtime instance by ID.
    async fn get_runtime_instance_by_id(
        &self,
        target: &ApiTarget,
        id: u64,
    ) -> Result<KubernetesRuntimeInstance, ApiError>;

    /// Fetch a Kubernetes runtime definition by ID.
    async fn get_runtime_definition_by_id(
        &self,
        target: &ApiTarget,
        id: u64,
    ) -> Result<KubernetesRuntimeDefinition, ApiError>;

    /// Fetch the root instance of the tree `target` belongs to.
    async fn get_genesis_instance(&self, target: &ApiTarget)
        -> Result<ControlPlaneInstance, ApiError>;
}
