//! Schema sources and search-path resolution
//!
//! A path is looked up in this order:
//! 1. the including file's directory (includes only)
//! 2. as given, relative to the working directory
//! 3. each search path, in order
//!
//! The first existing regular file wins.

use std::fs;
use std::path::{Path, PathBuf};

use super::errors::{LoadError, LoadResult};

/// Label used for inline sources without an explicit one
pub const INLINE_LABEL: &str = "<inline>";

/// Where a schema comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    /// Schema text handed over directly
    Inline { label: String, text: String },
    /// A file, resolved through the search paths
    Path(PathBuf),
}

impl SchemaSource {
    pub fn inline(text: impl Into<String>) -> Self {
        Self::labeled(INLINE_LABEL, text)
    }

    pub fn labeled(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Inline {
            label: label.into(),
            text: text.into(),
        }
    }

    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// Interprets a host-supplied string: text whose first non-blank
    /// character opens a JSON object is inline schema, anything else is a
    /// path.
    pub fn from_arg(arg: &str) -> Self {
        if arg.trim_start().starts_with('{') {
            Self::inline(arg)
        } else {
            Self::path(arg)
        }
    }

    /// Label used in logs and error locations
    pub fn label(&self) -> String {
        match self {
            SchemaSource::Inline { label, .. } => label.clone(),
            SchemaSource::Path(path) => path.display().to_string(),
        }
    }
}

/// A source whose text has been read
#[derive(Debug, Clone)]
pub struct LoadedSource {
    /// Label for logs and error locations
    pub origin: String,
    /// Canonical path for file sources, used to read each file once
    pub canonical: Option<PathBuf>,
    pub text: String,
}

impl LoadedSource {
    /// Directory includes are resolved against first
    pub fn directory(&self) -> Option<&Path> {
        self.canonical.as_deref().and_then(Path::parent)
    }
}

/// Resolves and reads schema sources
#[derive(Debug, Clone, Copy)]
pub struct SourceResolver<'a> {
    search_paths: &'a [PathBuf],
}

impl<'a> SourceResolver<'a> {
    pub fn new(search_paths: &'a [PathBuf]) -> Self {
        Self { search_paths }
    }

    /// Finds `path`, trying `relative_to` first when given
    pub fn locate(&self, path: &Path, relative_to: Option<&Path>) -> LoadResult<PathBuf> {
        let mut candidates: Vec<PathBuf> = Vec::new();
        if path.is_absolute() {
            candidates.push(path.to_path_buf());
        } else {
            if let Some(dir) = relative_to {
                candidates.push(dir.join(path));
            }
            candidates.push(path.to_path_buf());
            candidates.extend(self.search_paths.iter().map(|dir| dir.join(path)));
        }

        let found = candidates.into_iter().find(|candidate| candidate.is_file());
        let found = found.ok_or_else(|| {
            LoadError::source_unavailable(
                path.display().to_string(),
                format!("not found in {} search path(s)", self.search_paths.len()),
            )
        })?;

        fs::canonicalize(&found).map_err(|e| {
            LoadError::source_unavailable(found.display().to_string(), e.to_string())
        })
    }

    /// Reads a caller-supplied source
    pub fn read(&self, source: &SchemaSource) -> LoadResult<LoadedSource> {
        match source {
            SchemaSource::Inline { label, text } => Ok(LoadedSource {
                origin: label.clone(),
                canonical: None,
                text: text.clone(),
            }),
            SchemaSource::Path(path) => self.read_file(path, None),
        }
    }

    /// Reads an include of `parent`
    pub fn read_include(&self, include: &str, parent: &LoadedSource) -> LoadResult<LoadedSource> {
        self.read_file(Path::new(include), parent.directory())
    }

    fn read_file(&self, path: &Path, relative_to: Option<&Path>) -> LoadResult<LoadedSource> {
        let canonical = self.locate(path, relative_to)?;
        let text = fs::read_to_string(&canonical).map_err(|e| {
            LoadError::source_unavailable(canonical.display().to_string(), e.to_string())
        })?;

        Ok(LoadedSource {
            origin: canonical.display().to_string(),
            canonical: Some(canonical),
            text,
        })
    }
}
