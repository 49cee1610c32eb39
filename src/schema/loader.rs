//! Schema loader
//!
//! Drives one load unit through parsing, resolution, validation and
//! commit. Nothing reaches the registry until every descriptor in the unit
//! has been built and validated; any failure leaves the registry exactly as
//! it was.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;

use crate::factory::{Declarations, DescriptorFactory, ResolutionView};
use crate::observability::{log_event_with_fields, Event, MetricsRegistry, ObservationScope};
use crate::registry::TypeRegistry;

use super::compiler::{JsonSchemaCompiler, SchemaCompiler};
use super::errors::{LoadError, LoadResult};
use super::source::{LoadedSource, SchemaSource, SourceResolver};
use super::unit::{LoadOutcome, LoadState, LoadUnit, ParsedUnit};
use super::validator::StructuralValidator;

/// How sources are located and expanded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Directories searched for relative paths and includes, in order
    pub search_paths: Vec<PathBuf>,
    /// Also load every schema reachable through `includes`
    pub include_all: bool,
}

/// Loads compiled schemas into a shared registry.
///
/// A loader holds no per-load state and may be shared across threads.
pub struct SchemaLoader {
    registry: Arc<TypeRegistry>,
    compiler: Arc<dyn SchemaCompiler>,
    options: LoadOptions,
    metrics: Arc<MetricsRegistry>,
}

impl SchemaLoader {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            compiler: Arc::new(JsonSchemaCompiler),
            options: LoadOptions::default(),
            metrics: Arc::new(MetricsRegistry::new()),
        }
    }

    pub fn with_options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_compiler(mut self, compiler: Arc<dyn SchemaCompiler>) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    /// Loads `sources` as a single unit.
    ///
    /// Either every type the sources define is installed, or none is.
    ///
    /// # Errors
    ///
    /// - `Parse` / `SourceUnavailable` while reading sources
    /// - `NameCollision` if any name is already registered, including by a
    ///   load that committed while this one was running
    /// - `UnresolvedReference`, `InvalidDefinition`, `StructuralCycle` for
    ///   schema faults
    pub fn load(&self, sources: &[SchemaSource]) -> LoadResult<LoadOutcome> {
        self.run(sources, true)
    }

    pub fn load_one(&self, source: SchemaSource) -> LoadResult<LoadOutcome> {
        self.load(std::slice::from_ref(&source))
    }

    /// Runs a load without committing. Reports the names a load would
    /// install right now.
    pub fn check(&self, sources: &[SchemaSource]) -> LoadResult<LoadOutcome> {
        self.run(sources, false)
    }

    fn run(&self, sources: &[SchemaSource], commit: bool) -> LoadResult<LoadOutcome> {
        let mut unit = LoadUnit::new(sources.iter().map(SchemaSource::label).collect());
        let unit_id = unit.id.to_string();
        let source_count = sources.len().to_string();
        let scope = ObservationScope::with_fields(
            if commit { "LOAD" } else { "CHECK" },
            &[("sources", &source_count), ("unit_id", &unit_id)],
        );
        self.metrics.increment_loads_started();

        match self.execute(&mut unit, sources, commit) {
            Ok(outcome) => {
                scope.complete_with_fields(&[("types", &outcome.names.len().to_string())]);
                Ok(outcome)
            }
            Err(err) => {
                unit.advance(LoadState::Failed);
                self.metrics.increment_loads_failed();
                scope.fail(err.code(), &err.to_string());
                Err(err)
            }
        }
    }

    fn execute(
        &self,
        unit: &mut LoadUnit,
        sources: &[SchemaSource],
        commit: bool,
    ) -> LoadResult<LoadOutcome> {
        self.prepare(unit, sources)?;

        let names = unit.batch_names();
        if !commit {
            unit.advance(LoadState::Done);
            self.metrics.increment_loads_checked();
            log_event_with_fields(
                Event::LoadChecked,
                &[("types", &names.len().to_string()), ("unit_id", &unit.id.to_string())],
            );
            return Ok(self.outcome(unit, names, true));
        }

        self.commit(unit)?;
        Ok(self.outcome(unit, names, false))
    }

    /// Parsing, Resolving and Validating. Leaves the validated batch in
    /// `unit.batch`; the registry is only read.
    fn prepare(&self, unit: &mut LoadUnit, sources: &[SchemaSource]) -> LoadResult<()> {
        let unit_id = unit.id.to_string();

        unit.units = self.parse_all(sources)?;
        log_event_with_fields(
            Event::LoadParsed,
            &[("files", &unit.units.len().to_string()), ("unit_id", &unit_id)],
        );
        unit.advance(LoadState::Resolving);

        let snapshot = self.registry.snapshot();
        unit.batch = {
            let decls = Declarations::collect(&unit.units, &snapshot)?;
            let factory = DescriptorFactory::new(ResolutionView::new(&snapshot, &decls));
            decls
                .iter()
                .map(|decl| factory.build(decl))
                .collect::<LoadResult<Vec<_>>>()?
        };
        let type_count = unit.batch.len().to_string();
        log_event_with_fields(
            Event::LoadResolved,
            &[
                ("generation", &snapshot.generation().to_string()),
                ("types", &type_count),
                ("unit_id", &unit_id),
            ],
        );
        unit.advance(LoadState::Validating);

        StructuralValidator::new(&snapshot, &unit.batch).validate()?;
        log_event_with_fields(
            Event::LoadValidated,
            &[("types", &type_count), ("unit_id", &unit_id)],
        );
        Ok(())
    }

    /// Committing. The registry may have moved on since the batch was
    /// resolved; `try_commit` rechecks names against the latest snapshot.
    fn commit(&self, unit: &mut LoadUnit) -> LoadResult<()> {
        let unit_id = unit.id.to_string();
        unit.advance(LoadState::Committing);

        if unit.batch.is_empty() {
            unit.advance(LoadState::Done);
            log_event_with_fields(Event::LoadEmpty, &[("unit_id", &unit_id)]);
            return Ok(());
        }

        let batch = std::mem::take(&mut unit.batch);
        let type_count = batch.len();
        if let Err(err) = self.registry.try_commit(batch) {
            if let LoadError::NameCollision { name } = &err {
                self.metrics.increment_commit_conflicts();
                log_event_with_fields(
                    Event::CommitConflict,
                    &[("name", name), ("unit_id", &unit_id)],
                );
            }
            return Err(err);
        }

        unit.advance(LoadState::Done);
        self.metrics.increment_loads_committed();
        self.metrics.add_types_installed(type_count as u64);
        log_event_with_fields(
            Event::LoadCommitted,
            &[
                ("generation", &self.registry.snapshot().generation().to_string()),
                ("types", &type_count.to_string()),
                ("unit_id", &unit_id),
            ],
        );
        Ok(())
    }

    fn outcome(&self, unit: &LoadUnit, names: Vec<String>, dry_run: bool) -> LoadOutcome {
        LoadOutcome {
            unit_id: unit.id,
            sources: unit.origins.clone(),
            names,
            started_at: unit.started_at,
            finished_at: Utc::now(),
            dry_run,
        }
    }

    /// Reads and compiles every source. With `include_all`, includes are
    /// processed depth-first ahead of the file naming them. Each file is
    /// read at most once per unit.
    fn parse_all(&self, sources: &[SchemaSource]) -> LoadResult<Vec<ParsedUnit>> {
        let resolver = SourceResolver::new(&self.options.search_paths);
        let mut seen = HashSet::new();
        let mut parsed = Vec::new();

        for source in sources {
            let loaded = resolver.read(source)?;
            self.parse_source(&resolver, loaded, false, &mut seen, &mut parsed)?;
        }

        Ok(parsed)
    }

    fn parse_source(
        &self,
        resolver: &SourceResolver<'_>,
        loaded: LoadedSource,
        included: bool,
        seen: &mut HashSet<PathBuf>,
        out: &mut Vec<ParsedUnit>,
    ) -> LoadResult<()> {
        if let Some(path) = &loaded.canonical {
            if !seen.insert(path.clone()) {
                return Ok(());
            }
        }

        let schema = self.compiler.compile(&loaded.origin, &loaded.text)?;

        if self.options.include_all {
            for include in &schema.includes {
                let child = resolver.read_include(include, &loaded)?;
                self.parse_source(resolver, child, true, seen, out)?;
            }
        }

        // An include whose types are all registered was loaded earlier.
        if included {
            let declared = schema.declared_names();
            if declared.iter().all(|name| self.registry.contains(name)) {
                log_event_with_fields(
                    Event::IncludeSatisfied,
                    &[("origin", &loaded.origin), ("types", &declared.len().to_string())],
                );
                return Ok(());
            }
        }

        out.push(ParsedUnit {
            origin: loaded.origin,
            schema,
        });
        Ok(())
    }
}

/// Loads one source into `registry`.
///
/// `source_or_path` is inline compiled schema text when its first
/// non-blank character is `{`, otherwise a path resolved through
/// `search_paths`. Returns the newly defined names in declaration order.
pub fn load_schema(
    registry: &Arc<TypeRegistry>,
    source_or_path: &str,
    search_paths: &[PathBuf],
) -> LoadResult<Vec<String>> {
    load_schemas(registry, &[source_or_path], search_paths)
}

/// Loads several sources into `registry` as one unit.
pub fn load_schemas<S: AsRef<str>>(
    registry: &Arc<TypeRegistry>,
    sources: &[S],
    search_paths: &[PathBuf],
) -> LoadResult<Vec<String>> {
    let sources: Vec<SchemaSource> = sources
        .iter()
        .map(|s| SchemaSource::from_arg(s.as_ref()))
        .collect();

    let loader = SchemaLoader::new(Arc::clone(registry)).with_options(LoadOptions {
        search_paths: search_paths.to_vec(),
        include_all: false,
    });
    loader.load(&sources).map(|outcome| outcome.names)
}
