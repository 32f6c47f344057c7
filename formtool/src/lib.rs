//! # formtool
//!
//! Command line host for [`schemaform`]: computes default data, prints
//! field plans and render trees, and validates data files against a
//! JSON Schema.
//!
//! ## Modules
//!
//! - [`commands`] - subcommand implementations
//! - [`files`] - extension-dispatched JSON / TOML reading and writing

/// Subcommand implementations.
pub mod commands;

/// JSON / TOML file handling.
pub mod files;

#[macro_use]
extern crate log;
#[macro_use]
extern crate anyhow;
