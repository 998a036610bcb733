//! core
//!
//! Local configuration and how it is assembled from remote objects.
//!
//! # Modules
//!
//! - [`config`] - Config document schema, loading and atomic persistence
//! - [`builder`] - Config entries built from remote control plane objects

pub mod builder;
pub mod config;
