//! config command - List or remove control planes in the local config

use crate::engine::Context;
use crate::ui::output;
use anyhow::{bail, Result};

use super::load_store;

/// List all control planes, marking the current one.
pub fn get_control_planes(ctx: &Context) -> Result<()> {
    let verbosity = ctx.verbosity();
    let store = load_store(ctx)?;
    let doc = store.document();

    if doc.has_stale_current() {
        if let Some(stale) = &doc.current_control_plane {
            output::warn(
                format!("current control plane '{}' is not in the config", stale),
                verbosity,
            );
        }
    }

    if doc.control_planes.is_empty() {
        output::print("No control planes configured.", verbosity);
        return Ok(());
    }

    let current = doc.current_control_plane.as_deref();
    let rows: Vec<Vec<String>> = doc
        .control_planes
        .iter()
        .map(|entry| {
            let marker = if current == Some(entry.name.as_str()) {
                "*"
            } else {
                ""
            };
            vec![
                marker.to_string(),
                entry.name.clone(),
                entry.api_server.clone(),
                entry.infra_provider.clone(),
                entry.auth_enabled.to_string(),
                entry.genesis.to_string(),
            ]
        })
        .collect();

    println!(
        "{}",
        output::format_table(
            &["CURRENT", "NAME", "API SERVER", "PROVIDER", "AUTH", "GENESIS"],
            &rows
        )
    );

    Ok(())
}

/// Remove a control plane from the local config.
pub fn delete_control_plane(ctx: &Context, name: &str) -> Result<()> {
    let verbosity = ctx.verbosity();
    let mut store = load_store(ctx)?;
    let was_current = store.document().current_control_plane.as_deref() == Some(name);

    let Some(removed) = store.remove(name)? else {
        bail!("Control plane '{}' is not in the config.", name);
    };

    output::success(
        format!("Removed control plane '{}' from the config.", removed.name),
        verbosity,
    );

    if was_current {
        output::warn(
            "no current control plane is set; run 'tptctl config current-control-plane' to choose one",
            verbosity,
        );
    }
    if removed.genesis {
        output::warn(
            format!("'{}' was the genesis control plane", removed.name),
            verbosity,
        );
    }

    Ok(())
}
