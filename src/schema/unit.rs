//! Load unit lifecycle
//!
//! A load unit is one invocation of the loader over one or more sources.
//! It moves strictly forward:
//!
//! ```text
//! Parsing -> Resolving -> Validating -> Committing -> Done
//!    \___________\_____________\____________\-------> Failed
//! ```
//!
//! A check run stops after Validating and goes straight to Done.
//! The registry is only ever written in Committing.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::registry::TypeDescriptor;

use super::ast::CompiledSchema;

/// Phase of a load unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    Parsing,
    Resolving,
    Validating,
    Committing,
    Done,
    Failed,
}

impl LoadState {
    pub fn state_name(&self) -> &'static str {
        match self {
            LoadState::Parsing => "Parsing",
            LoadState::Resolving => "Resolving",
            LoadState::Validating => "Validating",
            LoadState::Committing => "Committing",
            LoadState::Done => "Done",
            LoadState::Failed => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LoadState::Done | LoadState::Failed)
    }

    pub fn can_transition_to(&self, next: LoadState) -> bool {
        use LoadState::*;
        match (self, next) {
            (Parsing, Resolving)
            | (Resolving, Validating)
            | (Validating, Committing)
            | (Validating, Done)
            | (Committing, Done) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

/// One parsed source
#[derive(Debug, Clone)]
pub struct ParsedUnit {
    pub origin: String,
    pub schema: CompiledSchema,
}

/// Working state of a single load
#[derive(Debug)]
pub struct LoadUnit {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    state: LoadState,
    /// Caller-supplied source labels
    pub origins: Vec<String>,
    /// Parsed sources in processing order, includes first
    pub units: Vec<ParsedUnit>,
    /// Descriptors built in Resolving, in declaration order
    pub batch: Vec<TypeDescriptor>,
}

impl LoadUnit {
    pub fn new(origins: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            state: LoadState::Parsing,
            origins,
            units: Vec::new(),
            batch: Vec::new(),
        }
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    /// Moves to `next`. Out-of-order transitions are a loader bug.
    pub fn advance(&mut self, next: LoadState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal load transition {} -> {}",
            self.state.state_name(),
            next.state_name()
        );
        self.state = next;
    }

    /// Names of the built batch in declaration order
    pub fn batch_names(&self) -> Vec<String> {
        self.batch.iter().map(|d| d.name().to_string()).collect()
    }
}

/// Result of a finished load
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadOutcome {
    pub unit_id: Uuid,
    /// Source labels as the caller gave them
    pub sources: Vec<String>,
    /// Newly defined names in declaration order
    pub names: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// True for a check run; nothing was committed
    pub dry_run: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        assert!(LoadState::Parsing.can_transition_to(LoadState::Resolving));
        assert!(LoadState::Validating.can_transition_to(LoadState::Committing));
        assert!(LoadState::Validating.can_transition_to(LoadState::Done));
        assert!(LoadState::Committing.can_transition_to(LoadState::Done));
    }

    #[test]
    fn test_no_skipping_or_going_back() {
        assert!(!LoadState::Parsing.can_transition_to(LoadState::Committing));
        assert!(!LoadState::Resolving.can_transition_to(LoadState::Parsing));
        assert!(!LoadState::Done.can_transition_to(LoadState::Failed));
        assert!(!LoadState::Failed.can_transition_to(LoadState::Parsing));
    }

    #[test]
    fn test_any_live_state_can_fail() {
        for state in [
            LoadState::Parsing,
            LoadState::Resolving,
            LoadState::Validating,
            LoadState::Committing,
        ] {
            assert!(state.can_transition_to(LoadState::Failed), "{:?}", state);
        }
    }

    #[test]
    fn test_new_unit_starts_parsing() {
        let unit = LoadUnit::new(vec!["a.json".into()]);
        assert_eq!(unit.state(), LoadState::Parsing);
        assert!(unit.batch_names().is_empty());
    }
}
