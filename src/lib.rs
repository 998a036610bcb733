//! tptctl - Admin CLI for Threeport control planes
//!
//! tptctl keeps a local config of known control planes and switches the
//! current one. When a requested control plane is not in the config it is
//! discovered by asking the current control plane's API for its children,
//! falling back to the genesis control plane when that fails.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Control plane name resolution
//! - [`core`] - Config document, config store and entry builder
//! - [`api`] - Control plane API client abstraction with HTTP and mock implementations
//! - [`ui`] - Terminal output
//!
//! # Invariants
//!
//! 1. The config file is only ever replaced atomically
//! 2. An entry is written only once all of its metadata has been fetched
//! 3. A name already in the config never triggers a remote call

pub mod api;
pub mod cli;
pub mod core;
pub mod engine;
pub mod ui;
