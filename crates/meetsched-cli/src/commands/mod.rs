//! Subcommand implementations.

pub mod config;
pub mod consent;
pub mod serve;
