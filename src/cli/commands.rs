//! CLI command implementations
//!
//! Each invocation builds a fresh registry, applies configuration, loads
//! any preload schemas as their own unit and then runs the command against
//! the sources given on the command line.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::config::LoaderConfig;
use crate::observability::{Logger, Severity};
use crate::registry::TypeRegistry;
use crate::schema::{LoadOptions, SchemaLoader, SchemaSource};

use super::args::{Command, SourceArgs};
use super::errors::{CliError, CliResult};
use super::io::{write_error, write_response};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    Logger::set_stderr_only(true);
    run_command(cli.command)
}

/// Run a command and write its response envelope
pub fn run_command(cmd: Command) -> CliResult<()> {
    match execute(cmd) {
        Ok(data) => write_response(data),
        Err(e) => {
            write_error(e.code_str(), e.message())?;
            Err(e)
        }
    }
}

/// Run a command and return the response data
pub fn execute(cmd: Command) -> CliResult<Value> {
    match cmd {
        Command::Load { sources } => load(&sources),
        Command::Check { sources } => check(&sources),
        Command::Describe { sources, type_name } => describe(&sources, type_name.as_deref()),
    }
}

/// Load sources and report the newly defined names
pub fn load(args: &SourceArgs) -> CliResult<Value> {
    let loader = prepare(args)?;
    let outcome = loader.load(&sources(args))?;
    Ok(serde_json::to_value(outcome)?)
}

/// Dry run: report the names a load would define
pub fn check(args: &SourceArgs) -> CliResult<Value> {
    let loader = prepare(args)?;
    let outcome = loader.check(&sources(args))?;
    Ok(serde_json::to_value(outcome)?)
}

/// Load sources and print descriptors, either of the loaded types or of
/// one named type
pub fn describe(args: &SourceArgs, type_name: Option<&str>) -> CliResult<Value> {
    let loader = prepare(args)?;
    let outcome = loader.load(&sources(args))?;
    let registry = loader.registry();

    match type_name {
        Some(name) => {
            let desc = registry
                .lookup(name)
                .ok_or_else(|| CliError::unknown_type(name))?;
            Ok(serde_json::to_value(desc.as_ref())?)
        }
        None => {
            let types = outcome
                .names
                .iter()
                .filter_map(|name| registry.lookup(name))
                .map(|desc| serde_json::to_value(desc.as_ref()))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(json!({ "unit_id": outcome.unit_id, "types": types }))
        }
    }
}

fn sources(args: &SourceArgs) -> Vec<SchemaSource> {
    args.files
        .iter()
        .map(|arg| SchemaSource::from_arg(arg))
        .collect()
}

/// Applies configuration and preloads, returning a loader over a fresh
/// registry.
///
/// Search order is `-I` directories first, then configured search paths.
fn prepare(args: &SourceArgs) -> CliResult<SchemaLoader> {
    let config = match &args.config {
        Some(path) => LoaderConfig::load(path)?,
        None => LoaderConfig::default(),
    };

    let level = match &args.log_level {
        Some(level) => level.parse::<Severity>().map_err(CliError::config_error)?,
        None => config.severity()?,
    };
    Logger::set_min_severity(level);

    let configured = config.to_options();
    let mut search_paths = args.include_dirs.clone();
    search_paths.extend(configured.search_paths);
    let options = LoadOptions {
        search_paths,
        include_all: configured.include_all || args.all,
    };

    let loader = SchemaLoader::new(Arc::new(TypeRegistry::new())).with_options(options);

    if !config.preload.is_empty() {
        let preload: Vec<SchemaSource> = config
            .preload
            .iter()
            .cloned()
            .map(SchemaSource::Path)
            .collect();
        loader.load(&preload)?;
    }

    Ok(loader)
}
