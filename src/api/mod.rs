//! api
//!
//! Client side of the control plane REST API.
//!
//! # Architecture
//!
//! The [`RemoteTopologyClient`] trait is the only thing the resolver sees.
//! Callers derive an [`ApiTarget`] from a local config entry and pass it to
//! each call, so one client can talk to any control plane in the tree.
//!
//! # Modules
//!
//! - `traits`: the trait, wire objects, `ApiTarget` and `ApiError`
//! - [`http`]: reqwest implementation
//! - [`mock`]: in-memory implementation for deterministic testing

pub mod http;
pub mod mock;
mod traits;

pub use http::HttpTopologyClient;
pub use traits::*;
