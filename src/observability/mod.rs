//! Observability for schema loading
//!
//! - Structured logging (JSON lines)
//! - Monotonic load counters
//! - Load unit lifecycle scopes
//!
//! Observability is read-only: nothing here can fail or alter a load.
//!
//! # Usage
//!
//! ```ignore
//! use typeload::observability::{log_event_with_fields, Event, ObservationScope};
//!
//! let scope = ObservationScope::with_fields("LOAD", &[("unit", &unit_id)]);
//! log_event_with_fields(Event::LoadResolved, &[("types", "4")]);
//! scope.complete();
//! ```

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use scope::ObservationScope;

/// Log an event at its own severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log an event with fields at its own severity
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event() {
        log_event(Event::LoadParsed);
        log_event(Event::LoadCommitted);
    }

    #[test]
    fn test_log_event_with_fields() {
        log_event_with_fields(Event::ConfigLoaded, &[("path", "/tmp/typeload.json")]);
    }
}
