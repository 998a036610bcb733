//! ui
//!
//! User interaction utilities.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display
//!
//! All user-facing output goes through this module so quiet and debug
//! modes are honored consistently.

pub mod output;
