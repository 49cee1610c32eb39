//! Observable events emitted by the loader and its front ends
//!
//! Events are explicit and typed. Begin/complete/failed of a whole load unit
//! is logged through [`ObservationScope`](super::ObservationScope); these are
//! the points in between.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration file loaded
    ConfigLoaded,

    // Load unit phases
    /// All sources compiled into AST units
    LoadParsed,
    /// Included file skipped because its names are already registered
    IncludeSatisfied,
    /// Every definition resolved into a descriptor
    LoadResolved,
    /// Whole-batch structural checks passed
    LoadValidated,
    /// Batch installed in the registry
    LoadCommitted,
    /// Unit declared no types; nothing was published
    LoadEmpty,
    /// Dry run finished without touching the registry
    LoadChecked,

    // Registry
    /// A concurrent commit won the race for a name
    CommitConflict,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::LoadParsed => "LOAD_PARSED",
            Event::IncludeSatisfied => "INCLUDE_SATISFIED",
            Event::LoadResolved => "LOAD_RESOLVED",
            Event::LoadValidated => "LOAD_VALIDATED",
            Event::LoadCommitted => "LOAD_COMMITTED",
            Event::LoadEmpty => "LOAD_EMPTY",
            Event::LoadChecked => "LOAD_CHECKED",
            Event::CommitConflict => "COMMIT_CONFLICT",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::ConfigLoaded | Event::LoadCommitted | Event::LoadChecked => Severity::Info,
            Event::LoadEmpty => Severity::Warn,
            Event::CommitConflict => Severity::Warn,
            Event::LoadParsed
            | Event::IncludeSatisfied
            | Event::LoadResolved
            | Event::LoadValidated => Severity::Trace,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
