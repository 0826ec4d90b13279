//! meetsched command-line interface.
//!
//! This crate provides the `meetsched` binary: the HTTP server, the consent
//! URL helper and configuration tooling.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod secret;

pub use cli::Cli;
pub use error::{CliError, CliResult};
