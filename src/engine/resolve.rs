//! engine::resolve
//!
//! Map a requested control plane name to a usable local config entry.
//!
//! # Strategy
//!
//! First success wins:
//!
//! 1. A local entry with exactly the requested name becomes current. No
//!    remote call is made, even if a remote child has the same name.
//! 2. Otherwise the current control plane's immediate children are fetched
//!    and searched. A match is fully fetched, built, upserted and made
//!    current. Only one level is searched.
//! 3. Otherwise, if a local entry is marked genesis, resolution stops with
//!    a hint to switch to the genesis control plane and retry from there.
//! 4. Otherwise any local entry (the last in document order) is used to
//!    fetch the genesis instance, which is persisted and made current so
//!    the config is left pointing at a reachable root. The requested name
//!    is still reported as unresolved.
//! 5. With no local entries at all, resolution fails.
//!
//! Remote calls are issued one at a time and never retried. Nothing is
//! written unless every object needed for the new entry was fetched.

use thiserror::Error;

use crate::api::{ApiError, ApiTarget, ControlPlaneInstance, RemoteTopologyClient};
use crate::core::builder::build_entry;
use crate::core::config::{ConfigError, ConfigStore, ControlPlaneConfigEntry, ThreeportConfigDocument};

/// Errors that abort a resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Reading or writing the local config failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A remote call failed before any match was found.
    #[error("failed to {call} via control plane '{control_plane}': {source}")]
    Remote {
        call: &'static str,
        control_plane: String,
        #[source]
        source: ApiError,
    },

    /// A match was found but its entry could not be completed.
    #[error("found control plane '{name}' but failed to fetch its {what}: {reason}")]
    PartialMetadata {
        name: String,
        what: &'static str,
        reason: String,
    },

    /// The local config has no control planes to start from.
    #[error("no control planes are configured; configure at least one control plane first")]
    NoControlPlanes,
}

/// What the resolver was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveRequest {
    /// Name of the control plane to make current
    pub control_plane_name: String,
}

impl ResolveRequest {
    pub fn new(control_plane_name: impl Into<String>) -> Self {
        Self {
            control_plane_name: control_plane_name.into(),
        }
    }
}

/// How a resolution ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// A local entry matched and is now current.
    AlreadyCurrent,
    /// A child of the current control plane matched and was persisted.
    FoundAsChild {
        /// The control plane whose children were searched
        parent: String,
    },
    /// Nothing matched; the genesis instance was persisted and made current.
    FoundAsGenesisFallback {
        /// Name of the genesis control plane now current
        genesis: String,
    },
    /// Nothing matched; the user should switch to genesis and retry.
    Unresolvable {
        /// Name of the locally known genesis control plane
        genesis: String,
    },
}

/// Result of a resolution, with the warnings raised along the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub requested: String,
    pub outcome: ResolutionOutcome,
    pub warnings: Vec<String>,
}

impl Resolution {
    /// Whether the requested control plane is now current.
    ///
    /// The genesis fallback only counts when the fetched genesis is the
    /// requested control plane itself.
    pub fn is_success(&self) -> bool {
        match &self.outcome {
            ResolutionOutcome::AlreadyCurrent | ResolutionOutcome::FoundAsChild { .. } => true,
            ResolutionOutcome::FoundAsGenesisFallback { genesis } => *genesis == self.requested,
            ResolutionOutcome::Unresolvable { .. } => false,
        }
    }

    /// Whether the requested name could not be matched by any strategy.
    pub fn is_unresolvable(&self) -> bool {
        !self.is_success()
    }
}

/// Candidates recorded while scanning the local document.
#[derive(Debug, Default)]
struct LocalScan {
    direct_match: bool,
    genesis: Option<ControlPlaneConfigEntry>,
    current: Option<ControlPlaneConfigEntry>,
    any: Option<ControlPlaneConfigEntry>,
}

impl LocalScan {
    fn run(document: &ThreeportConfigDocument, requested: &str) -> Self {
        let current_name = document.current_control_plane.as_deref();
        let mut scan = LocalScan::default();

        for entry in &document.control_planes {
            if entry.name == requested {
                scan.direct_match = true;
                return scan;
            }
            if entry.genesis && scan.genesis.is_none() {
                scan.genesis = Some(entry.clone());
            }
            if current_name == Some(entry.name.as_str()) {
                scan.current = Some(entry.clone());
            }
        }

        // Document order is the tie-break: the last entry stands in for "any"
        scan.any = document.control_planes.last().cloned();
        scan
    }
}

/// Resolves control plane names against the local config and remote API.
pub struct TopologyResolver<'a> {
    client: &'a dyn RemoteTopologyClient,
}

impl<'a> TopologyResolver<'a> {
    pub fn new(client: &'a dyn RemoteTopologyClient) -> Self {
        Self { client }
    }

    /// Resolve `request` and update `store` accordingly.
    pub async fn resolve(
        &self,
        store: &mut ConfigStore,
        request: &ResolveRequest,
    ) -> Result<Resolution, ResolveError> {
        let requested = request.control_plane_name.as_str();
        let mut warnings = Vec::new();
        let scan = LocalScan::run(store.document(), requested);

        if scan.direct_match {
            tracing::debug!(control_plane = requested, "matched local entry");
            store.set_current(requested)?;
            return Ok(Resolution {
                requested: requested.to_string(),
                outcome: ResolutionOutcome::AlreadyCurrent,
                warnings,
            });
        }

        match &scan.current {
            Some(current) => {
                if let Some(entry) = self.search_children(current, requested).await? {
                    store.upsert(entry)?;
                    store.set_current(requested)?;
                    return Ok(Resolution {
                        requested: requested.to_string(),
                        outcome: ResolutionOutcome::FoundAsChild {
                            parent: current.name.clone(),
                        },
                        warnings,
                    });
                }
                tracing::debug!(
                    control_plane = requested,
                    parent = %current.name,
                    "no matching child"
                );
            }
            None => {
                let warning = match &store.document().current_control_plane {
                    Some(stale) => format!(
                        "current control plane '{}' is not in the config; cannot search its children",
                        stale
                    ),
                    None => "no current control plane is set; cannot search its children"
                        .to_string(),
                };
                warnings.push(warning);
            }
        }

        if let Some(genesis) = scan.genesis {
            return Ok(Resolution {
                requested: requested.to_string(),
                outcome: ResolutionOutcome::Unresolvable {
                    genesis: genesis.name,
                },
                warnings,
            });
        }

        let Some(any) = scan.any else {
            return Err(ResolveError::NoControlPlanes);
        };

        tracing::debug!(via = %any.name, "falling back to genesis control plane");
        let target = self.target_for(&any)?;
        let genesis = self
            .client
            .get_genesis_instance(&target)
            .await
            .map_err(|source| ResolveError::Remote {
                call: "fetch the genesis control plane instance",
                control_plane: any.name.clone(),
                source,
            })?;

        let mut entry = self.fetch_entry(&target, &genesis).await?;
        entry.genesis = true;
        let genesis_name = entry.name.clone();
        store.upsert(entry)?;
        store.set_current(&genesis_name)?;

        Ok(Resolution {
            requested: requested.to_string(),
            outcome: ResolutionOutcome::FoundAsGenesisFallback {
                genesis: genesis_name,
            },
            warnings,
        })
    }

    /// Look for `requested` among the immediate children of `current`.
    ///
    /// Returns the fully built entry for a match.
    async fn search_children(
        &self,
        current: &ControlPlaneConfigEntry,
        requested: &str,
    ) -> Result<Option<ControlPlaneConfigEntry>, ResolveError> {
        tracing::debug!(parent = %current.name, "searching children of current control plane");
        let target = self.target_for(current)?;
        let node = self
            .client
            .get_instance_by_name(&target, &current.name)
            .await
            .map_err(|source| ResolveError::Remote {
                call: "fetch the current control plane instance",
                control_plane: current.name.clone(),
                source,
            })?;

        match node.children.iter().find(|child| child.name == requested) {
            Some(child) => Ok(Some(self.fetch_entry(&target, child).await?)),
            None => Ok(None),
        }
    }

    /// Fetch the objects `instance` references and build its entry.
    async fn fetch_entry(
        &self,
        target: &ApiTarget,
        instance: &ControlPlaneInstance,
    ) -> Result<ControlPlaneConfigEntry, ResolveError> {
        let partial = |what: &'static str, reason: String| ResolveError::PartialMetadata {
            name: instance.name.clone(),
            what,
            reason,
        };

        let definition = self
            .client
            .get_definition_by_id(target, instance.control_plane_definition_id)
            .await
            .map_err(|e| partial("control plane definition", e.to_string()))?;
        let runtime_instance = self
            .client
            .get_runtime_instance_by_id(target, instance.kubernetes_runtime_instance_id)
            .await
            .map_err(|e| partial("kubernetes runtime instance", e.to_string()))?;
        let runtime_definition = self
            .client
            .get_runtime_definition_by_id(
                target,
                runtime_instance.kubernetes_runtime_definition_id,
            )
            .await
            .map_err(|e| partial("kubernetes runtime definition", e.to_string()))?;

        build_entry(instance, &definition, &runtime_instance, &runtime_definition)
            .map_err(|e| partial("credentials", e.to_string()))
    }

    fn target_for(&self, entry: &ControlPlaneConfigEntry) -> Result<ApiTarget, ResolveError> {
        ApiTarget::from_entry(entry).map_err(|source| ResolveError::Remote {
            call: "build an API client",
            control_plane: entry.name.clone(),
            source,
        })
    }
}
