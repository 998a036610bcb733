//! cli
//!
//! Command-line interface layer for tptctl.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Delegate to command handlers
//! - Report outcomes to the user
//!
//! # Architecture
//!
//! The CLI layer is thin. Flags are parsed once into an
//! [`engine::Context`] that is passed explicitly to every handler; config
//! mutation happens in [`crate::core::config`] and name resolution in
//! [`crate::engine::resolve`].

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use crate::engine;
use anyhow::Result;

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run(cli: Cli) -> Result<()> {
    let ctx = engine::Context {
        config_path: cli.config.clone(),
        debug: cli.debug,
        quiet: cli.quiet,
    };

    commands::dispatch(cli.command, &ctx)
}
