//! Load error taxonomy
//!
//! Every failure aborts the whole load unit with zero registry mutation.
//! Nothing is retried inside the loader.
//!
//! Error codes:
//! - SCHEMA_PARSE_ERROR (malformed source)
//! - SCHEMA_NAME_COLLISION (name already defined)
//! - SCHEMA_UNRESOLVED_REFERENCE (reference to an undefined type)
//! - SCHEMA_STRUCTURAL_CYCLE (by-value self-containment or inheritance cycle)
//! - SCHEMA_INVALID_DEFINITION (reference to a type of the wrong kind)
//! - SCHEMA_SOURCE_UNAVAILABLE (source file not found or unreadable)

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Discriminant of a [`LoadError`], for adapters that translate errors
/// into host-native error objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadErrorKind {
    Parse,
    NameCollision,
    UnresolvedReference,
    StructuralCycle,
    InvalidDefinition,
    SourceUnavailable,
}

impl LoadErrorKind {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            LoadErrorKind::Parse => "SCHEMA_PARSE_ERROR",
            LoadErrorKind::NameCollision => "SCHEMA_NAME_COLLISION",
            LoadErrorKind::UnresolvedReference => "SCHEMA_UNRESOLVED_REFERENCE",
            LoadErrorKind::StructuralCycle => "SCHEMA_STRUCTURAL_CYCLE",
            LoadErrorKind::InvalidDefinition => "SCHEMA_INVALID_DEFINITION",
            LoadErrorKind::SourceUnavailable => "SCHEMA_SOURCE_UNAVAILABLE",
        }
    }
}

impl fmt::Display for LoadErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Position in a schema source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    /// File path or inline label
    pub source: String,
    /// 1-based line, 0 when unknown
    pub line: usize,
    /// 1-based column, 0 when unknown
    pub column: usize,
}

impl SourceLocation {
    pub fn new(source: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            source: source.into(),
            line,
            column,
        }
    }

    /// A location that only names the source
    pub fn whole(source: impl Into<String>) -> Self {
        Self::new(source, 0, 0)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            write!(f, "{}", self.source)
        } else {
            write!(f, "{}:{}:{}", self.source, self.line, self.column)
        }
    }
}

/// The single error type produced by a load
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("parse error at {location}: {message}")]
    Parse {
        location: SourceLocation,
        message: String,
    },

    #[error("'{name}' is already defined")]
    NameCollision { name: String },

    #[error("'{name}' referenced from '{referenced_from}' is not defined")]
    UnresolvedReference {
        name: String,
        referenced_from: String,
    },

    #[error("structural cycle: {}", path.join(" -> "))]
    StructuralCycle { path: Vec<String> },

    #[error("invalid definition of '{name}': {reason}")]
    InvalidDefinition { name: String, reason: String },

    #[error("schema source '{origin}' is unavailable: {reason}")]
    SourceUnavailable { origin: String, reason: String },
}

impl LoadError {
    pub fn parse(location: SourceLocation, message: impl Into<String>) -> Self {
        Self::Parse {
            location,
            message: message.into(),
        }
    }

    pub fn name_collision(name: impl Into<String>) -> Self {
        Self::NameCollision { name: name.into() }
    }

    pub fn unresolved(name: impl Into<String>, referenced_from: impl Into<String>) -> Self {
        Self::UnresolvedReference {
            name: name.into(),
            referenced_from: referenced_from.into(),
        }
    }

    pub fn cycle(path: Vec<String>) -> Self {
        Self::StructuralCycle { path }
    }

    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn source_unavailable(origin: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            origin: origin.into(),
            reason: reason.into(),
        }
    }

    /// Returns the discriminant
    pub fn kind(&self) -> LoadErrorKind {
        match self {
            LoadError::Parse { .. } => LoadErrorKind::Parse,
            LoadError::NameCollision { .. } => LoadErrorKind::NameCollision,
            LoadError::UnresolvedReference { .. } => LoadErrorKind::UnresolvedReference,
            LoadError::StructuralCycle { .. } => LoadErrorKind::StructuralCycle,
            LoadError::InvalidDefinition { .. } => LoadErrorKind::InvalidDefinition,
            LoadError::SourceUnavailable { .. } => LoadErrorKind::SourceUnavailable,
        }
    }

    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        self.kind().code()
    }
}

/// Result type for load operations
pub type LoadResult<T> = Result<T, LoadError>;
