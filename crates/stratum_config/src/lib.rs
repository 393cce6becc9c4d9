//! Parsing and validation of `stratum.toml` floorplanning configuration files.
//!
//! This crate reads a configuration file and produces a strongly-typed
//! [`FloorplanConfig`] covering the die stack, the annealing schedule, the
//! cost weights, and the thermal model. Every section has defaults, so an
//! empty file is a valid configuration.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, to_toml_string, validate_config};
pub use types::*;
