//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Locates and loads the config document
//! 2. Calls into core/engine to do the work
//! 3. Formats and displays output
//!
//! # Async Commands
//!
//! Commands that talk to a control plane API build a tokio runtime and
//! block on the async implementation; remote calls stay sequential.

mod completion;
mod config_cmd;
mod current_control_plane;

pub use completion::completion;
pub use config_cmd::{delete_control_plane, get_control_planes};
pub use current_control_plane::current_control_plane;

use crate::cli::args::{Command, ConfigAction};
use crate::core::config::ConfigStore;
use crate::engine::Context;
use anyhow::Result;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Config { action } => match action {
            ConfigAction::CurrentControlPlane { control_plane_name } => {
                current_control_plane::current_control_plane(ctx, &control_plane_name)
            }
            ConfigAction::GetControlPlanes => config_cmd::get_control_planes(ctx),
            ConfigAction::DeleteControlPlane { name } => {
                config_cmd::delete_control_plane(ctx, &name)
            }
        },
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// Locate and load the config document for this invocation.
pub(crate) fn load_store(ctx: &Context) -> Result<ConfigStore> {
    let path = ConfigStore::discover_path(ctx.config_path.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to locate config file: {}", e))?;

    ConfigStore::load(&path).map_err(|e| {
        if e.is_not_found() {
            anyhow::anyhow!(
                "{}. Install a control plane or pass --config to point at an existing config.",
                e
            )
        } else {
            anyhow::Error::new(e)
        }
    })
}
