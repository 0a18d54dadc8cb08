//! CLI module for aeropolicy
//!
//! Provides command-line interface for:
//! - check: Validate a manifest against the schema catalog
//! - fmt: Print or rewrite a manifest in canonical form
//! - ingress: Print merged ingress schemas as JSON
//! - capabilities: Print storage capability sets as JSON

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{
    capabilities, check, check_report, fmt, ingress, run, run_command, Config, Session,
};
pub use errors::{CliError, CliErrorCode, CliResult};
