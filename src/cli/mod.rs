//! CLI module for typeload
//!
//! Provides command-line interface for:
//! - load: Load schemas into a fresh registry
//! - check: Resolve and validate without installing
//! - describe: Print installed type descriptors

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, SourceArgs};
pub use commands::{check, describe, execute, load, run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_error, write_response};
