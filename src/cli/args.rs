//! CLI argument definitions using clap
//!
//! Commands:
//! - aeropolicy check <manifest> --config <path>
//! - aeropolicy fmt <manifest> --config <path> [--write]
//! - aeropolicy ingress <manifest> --config <path>
//! - aeropolicy capabilities <manifest> --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// aeropolicy - data usage policies and ingress validation
#[derive(Parser, Debug)]
#[command(name = "aeropolicy")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse and validate a manifest, printing a summary
    Check {
        /// Policy manifest file
        manifest: PathBuf,

        /// Path to configuration file
        #[arg(long, default_value = "./aeropolicy.json")]
        config: PathBuf,
    },

    /// Print a manifest in canonical form
    Fmt {
        /// Policy manifest file
        manifest: PathBuf,

        /// Path to configuration file
        #[arg(long, default_value = "./aeropolicy.json")]
        config: PathBuf,

        /// Rewrite the manifest file in place instead of printing
        #[arg(long)]
        write: bool,
    },

    /// Print the merged ingress schemas of a manifest as JSON
    Ingress {
        /// Policy manifest file
        manifest: PathBuf,

        /// Path to configuration file
        #[arg(long, default_value = "./aeropolicy.json")]
        config: PathBuf,
    },

    /// Print storage capabilities per policy target as JSON
    Capabilities {
        /// Policy manifest file
        manifest: PathBuf,

        /// Path to configuration file
        #[arg(long, default_value = "./aeropolicy.json")]
        config: PathBuf,
    },
}

impl Command {
    /// Name used in log lines
    pub fn name(&self) -> &'static str {
        match self {
            Command::Check { .. } => "check",
            Command::Fmt { .. } => "fmt",
            Command::Ingress { .. } => "ingress",
            Command::Capabilities { .. } => "capabilities",
        }
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
