//! Shared test utilities for the stratum workspace.
//!
//! Fixtures used by more than one crate's test suite. Dev-dependency only,
//! never published.
//!
//! # Modules
//!
//! - [`components`]: sample component declarations and a registry holding them
//! - [`config`]: [`ConfigDir`] for writing configuration files to a temp dir

pub mod components;
pub mod config;

pub use config::ConfigDir;
