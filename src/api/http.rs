//! api::http
//!
//! REST implementation of [`RemoteTopologyClient`].
//!
//! # Design
//!
//! All objects live under the `/v0` prefix and come back wrapped in an
//! envelope whose `Data` array holds the matches. Single-object lookups
//! take the first element; an empty array is `NotFound`.
//!
//! A reqwest client is built per [`ApiTarget`] so each control plane gets
//! its own trust root and client certificate. Nothing is retried.
//!
//! # Example
//!
//! ```ignore
//! use tptctl::api::{ApiTarget, HttpTopologyClient, RemoteTopologyClient};
//!
//! let api = HttpTopologyClient::new();
//! let target = ApiTarget::insecure("http://localhost:1323");
//! let instance = api.get_instance_by_name(&target, "prod").await?;
//! for child in &instance.children {
//!     println!("{}", child.name);
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Certificate, Client, Identity, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::traits::{
    ApiError, ApiTarget, ControlPlaneDefinition, ControlPlaneInstance, KubernetesRuntimeDefinition,
    KubernetesRuntimeInstance, RemoteTopologyClient,
};

/// API version path prefix.
const API_VERSION: &str = "v0";

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = concat!("tptctl/", env!("CARGO_PKG_VERSION"));

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the control plane REST API.
#[derive(Debug, Clone)]
pub struct HttpTopologyClient {
    timeout: Duration,
}

impl Default for HttpTopologyClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTopologyClient {
    /// Create a client with the default timeout.
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a reqwest client for `target`, loading its TLS material.
    fn client_for(&self, target: &ApiTarget) -> Result<Client, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let mut builder = Client::builder()
            .default_headers(headers)
            .timeout(self.timeout);

        if let Some(tls) = &target.tls {
            let ca = Certificate::from_pem(tls.ca_cert.as_bytes())
                .map_err(|e| ApiError::Tls(format!("invalid CA certificate: {}", e)))?;
            // Accepts PKCS#1, PKCS#8 and SEC1 keys
            let mut pem = Vec::with_capacity(tls.client_cert.len() + tls.client_key.len() + 1);
            pem.extend_from_slice(tls.client_cert.as_bytes());
            pem.push(b'\n');
            pem.extend_from_slice(tls.client_key.as_bytes());
            let identity = Identity::from_pem(&pem)
                .map_err(|e| ApiError::Tls(format!("invalid client certificate: {}", e)))?;
            builder = builder
                .use_rustls_tls()
                .add_root_certificate(ca)
                .identity(identity);
        }

        builder
            .build()
            .map_err(|e| ApiError::Tls(format!("failed to build HTTP client: {}", e)))
    }

    /// Build URL for an API path.
    fn url(target: &ApiTarget, path: &str) -> String {
        format!("{}/{}/{}", target.base_url, API_VERSION, path)
    }

    /// Send a GET and return the first object of the response envelope.
    async fn get_one<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<T, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let envelope: Envelope<T> = handle_response(response).await?;
        envelope
            .data
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::NotFound(what.to_string()))
    }
}

/// Map a response to a decoded body or an `ApiError`.
async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();

    if status.is_success() {
        return response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()));
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.error.or(b.message))
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string()
            } else {
                trimmed.to_string()
            }
        });

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::AuthFailed(message),
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        _ => ApiError::Api {
            status: status.as_u16(),
            message,
        },
    })
}

#[async_trait]
impl RemoteTopologyClient for HttpTopologyClient {
    async fn get_instance_by_name(
        &self,
        target: &ApiTarget,
        name: &str,
    ) -> Result<ControlPlaneInstance, ApiError> {
        tracing::debug!(base_url = %target.base_url, name, "fetching control plane instance");
        let client = self.client_for(target)?;
        let request = client
            .get(Self::url(target, "control-plane-instances"))
            .query(&[("name", name)]);
        self.get_one(request, &format!("control plane instance '{}'", name))
            .await
    }

    async fn get_definition_by_id(
        &self,
        target: &ApiTarget,
        id: u64,
    ) -> Result<ControlPlaneDefinition, ApiError> {
        tracing::debug!(base_url = %target.base_url, id, "fetching control plane definition");
        let client = self.client_for(target)?;
        let request = client.get(Self::url(
            target,
            &format!("control-plane-definitions/{}", id),
        ));
        self.get_one(request, &format!("control plane definition {}", id))
            .await
    }

    async fn get_runtime_instance_by_id(
        &self,
        target: &ApiTarget,
        id: u64,
    ) -> Result<KubernetesRuntimeInstance, ApiError> {
        tracing::debug!(base_url = %target.base_url, id, "fetching kubernetes runtime instance");
        let client = self.client_for(target)?;
        let request = client.get(Self::url(
            target,
            &format!("kubernetes-runtime-instances/{}", id),
        ));
        self.get_one(request, &format!("kubernetes runtime instance {}", id))
            .await
    }

    async fn get_runtime_definition_by_id(
        &self,
        target: &ApiTarget,
        id: u64,
    ) -> Result<KubernetesRuntimeDefinition, ApiError> {
        tracing::debug!(base_url = %target.base_url, id, "fetching kubernetes runtime definition");
        let client = self.client_for(target)?;
        let request = client.get(Self::url(
            target,
            &format!("kubernetes-runtime-definitions/{}", id),
        ));
        self.get_one(request, &format!("kubernetes runtime definition {}", id))
            .await
    }

    async fn get_genesis_instance(
        &self,
        target: &ApiTarget,
    ) -> Result<ControlPlaneInstance, ApiError> {
        tracing::debug!(base_url = %target.base_url, "fetching genesis control plane instance");
        let client = self.client_for(target)?;
        let request = client
            .get(Self::url(target, "control-plane-instances"))
            .query(&[("genesis", "true")]);
        self.get_one(request, "genesis control plane instance").await
    }
}

// --------------------------------------------------------------------------
// Wire types
// --------------------------------------------------------------------------

/// Response envelope.
#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(rename = "Data", default = "Vec::new")]
    data: Vec<T>,
}

/// Error body returned by the API on failure.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(alias = "Error")]
    error: Option<String>,
    #[serde(alias = "Message")]
    message: Option<String>,
}
