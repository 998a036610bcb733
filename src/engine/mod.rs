//! engine
//!
//! Orchestration that sits between the CLI and the core/api layers.
//!
//! # Architecture
//!
//! Commands build a [`Context`] from their flags and hand it, together with
//! explicit request values, to the engine. Nothing here reads global state;
//! the resolver is a function of the config store, the request and the
//! remote client it is given.

pub mod resolve;

pub use resolve::{
    Resolution, ResolutionOutcome, ResolveError, ResolveRequest, TopologyResolver,
};

use std::path::PathBuf;

use crate::ui::output::Verbosity;

/// Execution context for commands.
///
/// Contains global settings derived from CLI flags that affect command behavior.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Config file override (`--config`).
    pub config_path: Option<PathBuf>,
    /// Debug logging enabled.
    pub debug: bool,
    /// Quiet mode (minimal output).
    pub quiet: bool,
}

impl Context {
    /// Output verbosity implied by the flags.
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.debug)
    }
}
