//! api::mock
//!
//! In-memory control plane API for deterministic testing.
//!
//! # Design
//!
//! The mock holds one topology regardless of which target is called, records
//! every call (with the base URL it was sent to) and can be told to fail a
//! particular call.
//!
//! # Example
//!
//! ```
//! use tptctl::api::mock::MockTopology;
//! use tptctl::api::{ApiTarget, RemoteTopologyClient};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let api = MockTopology::new()
//!     .with_control_plane("prod", 1, false, "eks")
//!     .with_control_plane("staging", 2, false, "eks")
//!     .with_child("prod", "staging");
//!
//! let target = ApiTarget::insecure("http://prod.local");
//! let prod = api.get_instance_by_name(&target, "prod").await.unwrap();
//! assert_eq!(prod.children[0].name, "staging");
//! assert_eq!(api.call_count(), 1);
//! # });
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::traits::{
    ApiError, ApiTarget, ControlPlaneDefinition, ControlPlaneInstance, KubernetesRuntimeDefinition,
    KubernetesRuntimeInstance, RemoteTopologyClient,
};

/// Mock topology for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone, Default)]
pub struct MockTopology {
    inner: Arc<Mutex<MockTopologyInner>>,
}

#[derive(Debug, Default)]
struct MockTopologyInner {
    /// Instances by name.
    instances: HashMap<String, ControlPlaneInstance>,
    definitions: HashMap<u64, ControlPlaneDefinition>,
    runtime_instances: HashMap<u64, KubernetesRuntimeInstance>,
    runtime_definitions: HashMap<u64, KubernetesRuntimeDefinition>,
    /// Name of the genesis instance.
    genesis: Option<String>,
    fail_on: Option<FailOn>,
    operations: Vec<MockOperation>,
}

/// Which call should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    GetInstanceByName(ApiError),
    GetDefinitionById(ApiError),
    GetRuntimeInstanceById(ApiError),
    GetRuntimeDefinitionById(ApiError),
    GetGenesisInstance(ApiError),
}

/// Recorded call for test verification.
#[derive(Debug, Clone, PartialEq)]
pub enum MockOperation {
    GetInstanceByName { base_url: String, name: String },
    GetDefinitionById { base_url: String, id: u64 },
    GetRuntimeInstanceById { base_url: String, id: u64 },
    GetRuntimeDefinitionById { base_url: String, id: u64 },
    GetGenesisInstance { base_url: String },
}

impl MockTopology {
    /// Create an empty topology.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a control plane and its definition and runtime objects.
    ///
    /// All four objects share `id`. Auth-enabled control planes get
    /// placeholder certificate strings derived from `name`.
    pub fn with_control_plane(
        self,
        name: &str,
        id: u64,
        auth_enabled: bool,
        infra_provider: &str,
    ) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            let cert = |kind: &str| auth_enabled.then(|| format!("{}-{}", kind, name));
            inner.instances.insert(
                name.to_string(),
                ControlPlaneInstance {
                    id: Some(id),
                    name: name.to_string(),
                    control_plane_definition_id: id,
                    kubernetes_runtime_instance_id: id,
                    api_server_endpoint: format!("http://{}.local:1323", name),
                    ca_cert: cert("ca"),
                    client_cert: cert("cert"),
                    client_key: cert("key"),
                    genesis: Some(false),
                    children: Vec::new(),
                },
            );
            inner.definitions.insert(
                id,
                ControlPlaneDefinition {
                    id: Some(id),
                    name: name.to_string(),
                    auth_enabled,
                },
            );
            inner.runtime_instances.insert(
                id,
                KubernetesRuntimeInstance {
                    id: Some(id),
                    name: format!("{}-runtime", name),
                    kubernetes_runtime_definition_id: id,
                },
            );
            inner.runtime_definitions.insert(
                id,
                KubernetesRuntimeDefinition {
                    id: Some(id),
                    name: format!("{}-runtime", name),
                    infra_provider: infra_provider.to_string(),
                },
            );
        }
        self
    }

    /// Attach the registered `child` under the registered `parent`.
    pub fn with_child(self, parent: &str, child: &str) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            let child = inner
                .instances
                .get(child)
                .cloned()
                .unwrap_or_else(|| panic!("unknown mock control plane '{}'", child));
            let parent = inner
                .instances
                .get_mut(parent)
                .unwrap_or_else(|| panic!("unknown mock control plane '{}'", parent));
            parent.children.push(child);
        }
        self
    }

    /// Mark the registered `name` as the genesis instance.
    pub fn with_genesis(self, name: &str) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            if let Some(instance) = inner.instances.get_mut(name) {
                instance.genesis = Some(true);
            }
            inner.genesis = Some(name.to_string());
        }
        self
    }

    /// Configure the mock to fail a specific call.
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.fail_on = Some(fail_on);
        }
        self
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        let inner = self.inner.lock().unwrap();
        inner.operations.clone()
    }

    /// Number of remote calls made so far.
    pub fn call_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.operations.len()
    }

    fn record(&self, op: MockOperation) {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(op);
    }

    fn check_fail(&self, expected: &str) -> Option<ApiError> {
        let inner = self.inner.lock().unwrap();
        match &inner.fail_on {
            Some(FailOn::GetInstanceByName(e)) if expected == "get_instance_by_name" => {
                Some(e.clone())
            }
            Some(FailOn::GetDefinitionById(e)) if expected == "get_definition_by_id" => {
                Some(e.clone())
            }
            Some(FailOn::GetRuntimeInstanceById(e)) if expected == "get_runtime_instance_by_id" => {
                Some(e.clone())
            }
            Some(FailOn::GetRuntimeDefinitionById(e))
                if expected == "get_runtime_definition_by_id" =>
            {
                Some(e.clone())
            }
            Some(FailOn::GetGenesisInstance(e)) if expected == "get_genesis_instance" => {
                Some(e.clone())
            }
            _ => None,
        }
    }
}

#[async_trait]
impl RemoteTopologyClient for MockTopology {
    async fn get_instance_by_name(
        &self,
        target: &ApiTarget,
        name: &str,
    ) -> Result<ControlPlaneInstance, ApiError> {
        self.record(MockOperation::GetInstanceByName {
            base_url: target.base_url.clone(),
            name: name.to_string(),
        });
        if let Some(e) = self.check_fail("get_instance_by_name") {
            return Err(e);
        }

        let inner = self.inner.lock().unwrap();
        inner
            .instances
            .get(name)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("control plane instance '{}'", name)))
    }

    async fn get_definition_by_id(
        &self,
        target: &ApiTarget,
        id: u64,
    ) -> Result<ControlPlaneDefinition, ApiError> {
        self.record(MockOperation::GetDefinitionById {
            base_url: target.base_url.clone(),
            id,
        });
        if let Some(e) = self.check_fail("get_definition_by_id") {
            return Err(e);
        }

        let inner = self.inner.lock().unwrap();
        inner
            .definitions
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("control plane definition {}", id)))
    }

    async fn get_runtime_instance_by_id(
        &self,
        target: &ApiTarget,
        id: u64,
    ) -> Result<KubernetesRuntimeInstance, ApiError> {
        self.record(MockOperation::GetRuntimeInstanceById {
            base_url: target.base_url.clone(),
            id,
        });
        if let Some(e) = self.check_fail("get_runtime_instance_by_id") {
            return Err(e);
        }

        let inner = self.inner.lock().unwrap();
        inner
            .runtime_instances
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("kubernetes runtime instance {}", id)))
    }

    async fn get_runtime_definition_by_id(
        &self,
        target: &ApiTarget,
        id: u64,
    ) -> Result<KubernetesRuntimeDefinition, ApiError> {
        self.record(MockOperation::GetRuntimeDefinitionById {
            base_url: target.base_url.clone(),
            id,
        });
        if let Some(e) = self.check_fail("get_runtime_definition_by_id") {
            return Err(e);
        }

        let inner = self.inner.lock().unwrap();
        inner
            .runtime_definitions
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("kubernetes runtime definition {}", id)))
    }

    async fn get_genesis_instance(
        &self,
        target: &ApiTarget,
    ) -> Result<ControlPlaneInstance, ApiError> {
        self.record(MockOperation::GetGenesisInstance {
            base_url: target.base_url.clone(),
        });
        if let Some(e) = self.check_fail("get_genesis_instance") {
            return Err(e);
        }

        let inner = self.inner.lock().unwrap();
        inner
            .genesis
            .as_ref()
            .and_then(|name| inner.instances.get(name))
            .cloned()
            .ok_or_else(|| ApiError::NotFound("genesis control plane instance".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> ApiTarget {
        ApiTarget::insecure("http://mock.local")
    }

    #[tokio::test]
    async fn registered_objects_resolve() {
        let api = MockTopology::new().with_control_plane("prod", 3, true, "eks");

        let instance = api.get_instance_by_name(&target(), "prod").await.unwrap();
        assert_eq!(instance.ca_cert.as_deref(), Some("ca-prod"));

        let def = api.get_definition_by_id(&target(), 3).await.unwrap();
        assert!(def.auth_enabled);

        let rt = api.get_runtime_instance_by_id(&target(), 3).await.unwrap();
        let rt_def = api
            .get_runtime_definition_by_id(&target(), rt.kubernetes_runtime_definition_id)
            .await
            .unwrap();
        assert_eq!(rt_def.infra_provider, "eks");
        assert_eq!(api.call_count(), 4);
    }

    #[tokio::test]
    async fn unknown_name_is_not_found() {
        let api = MockTopology::new();
        let result = api.get_instance_by_name(&target(), "ghost").await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn genesis_lookup() {
        let api = MockTopology::new()
            .with_control_plane("root", 1, false, "eks")
            .with_genesis("root");
        let genesis = api.get_genesis_instance(&target()).await.unwrap();
        assert_eq!(genesis.name, "root");
        assert_eq!(genesis.genesis, Some(true));
    }

    #[tokio::test]
    async fn fail_on_only_hits_that_call() {
        let api = MockTopology::new()
            .with_control_plane("prod", 1, false, "kind")
            .fail_on(FailOn::GetDefinitionById(ApiError::Network("down".into())));

        assert!(api.get_instance_by_name(&target(), "prod").await.is_ok());
        assert_eq!(
            api.get_definition_by_id(&target(), 1).await,
            Err(ApiError::Network("down".into()))
        );
    }

    #[tokio::test]
    async fn operations_record_base_url() {
        let api = MockTopology::new();
        let _ = api.get_genesis_instance(&target()).await;
        assert_eq!(
            api.operations(),
            vec![MockOperation::GetGenesisInstance {
                base_url: "http://mock.local".to_string()
            }]
        );
    }
}
