//! CLI argument definitions using clap
//!
//! Commands:
//! - typeload load <files..> [-I dir].. [--all] [--config path]
//! - typeload check <files..> [-I dir].. [--all] [--config path]
//! - typeload describe <files..> [--type name] [-I dir].. [--all] [--config path]

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// typeload - load compiled schemas into a type registry
#[derive(Parser, Debug)]
#[command(name = "typeload")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load schemas and print the newly defined type names
    Load {
        #[command(flatten)]
        sources: SourceArgs,
    },

    /// Resolve and validate schemas without installing anything
    Check {
        #[command(flatten)]
        sources: SourceArgs,
    },

    /// Load schemas and print the installed descriptors
    Describe {
        #[command(flatten)]
        sources: SourceArgs,

        /// Only print this fully-qualified type
        #[arg(long = "type", value_name = "NAME")]
        type_name: Option<String>,
    },
}

/// Options shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Compiled schema files, or inline schema text starting with '{'
    #[arg(required = true, value_name = "SOURCE")]
    pub files: Vec<String>,

    /// Add a directory to the schema search path
    #[arg(short = 'I', long = "include-dir", value_name = "DIR")]
    pub include_dirs: Vec<PathBuf>,

    /// Also load every schema reachable through includes
    #[arg(long)]
    pub all: bool,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Minimum log severity (overrides the configuration file)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
