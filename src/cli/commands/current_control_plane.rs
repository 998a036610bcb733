//! cli::commands::current_control_plane
//!
//! Switch the current control plane, discovering it remotely if needed.
//!
//! # Example
//!
//! ```bash
//! # Switch to a known control plane
//! tptctl config current-control-plane -n prod
//!
//! # Switch to a child of the current control plane
//! tptctl config current-control-plane -n staging
//! ```

use crate::api::HttpTopologyClient;
use crate::engine::{Context, ResolutionOutcome, ResolveRequest, TopologyResolver};
use crate::ui::output;
use anyhow::{bail, Result};

use super::load_store;

/// Run the current-control-plane command.
///
/// This is a synchronous wrapper that uses tokio to run the async implementation.
pub fn current_control_plane(ctx: &Context, name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("Control plane name cannot be empty.");
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(current_control_plane_async(ctx, name))
}

/// Async implementation of current-control-plane.
async fn current_control_plane_async(ctx: &Context, name: &str) -> Result<()> {
    let verbosity = ctx.verbosity();
    let mut store = load_store(ctx)?;
    output::debug(
        format!("using config {}", store.path().display()),
        verbosity,
    );

    let client = HttpTopologyClient::new();
    let resolution = TopologyResolver::new(&client)
        .resolve(&mut store, &ResolveRequest::new(name))
        .await?;

    for warning in &resolution.warnings {
        output::warn(warning, verbosity);
    }

    match &resolution.outcome {
        ResolutionOutcome::AlreadyCurrent => {
            output::success(
                format!("Current control plane set to '{}'.", name),
                verbosity,
            );
        }
        ResolutionOutcome::FoundAsChild { parent } => {
            output::success(
                format!(
                    "Found '{}' as a child of '{}', added it to the config and set it as current.",
                    name, parent
                ),
                verbosity,
            );
        }
        ResolutionOutcome::FoundAsGenesisFallback { genesis } if resolution.is_success() => {
            output::success(
                format!(
                    "Added genesis control plane '{}' to the config and set it as current.",
                    genesis
                ),
                verbosity,
            );
        }
        ResolutionOutcome::FoundAsGenesisFallback { genesis } => {
            output::print(
                format!(
                    "The current control plane has been set to the genesis control plane '{}'.\n\
                     Switch to each child in turn until you reach '{}'.",
                    genesis, name
                ),
                verbosity,
            );
        }
        ResolutionOutcome::Unresolvable { genesis } => {
            output::print(
                format!(
                    "Set the current control plane to the genesis control plane and traverse from there:\n\
                     \n    tptctl config current-control-plane -n {}\n",
                    genesis
                ),
                verbosity,
            );
        }
    }

    if resolution.is_unresolvable() {
        bail!("Could not resolve control plane '{}'.", name);
    }

    Ok(())
}
