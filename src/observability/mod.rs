//! Observability for the record lifecycle
//!
//! - Structured logging (JSON lines)
//! - Lifecycle counters
//!
//! Observability is read-only: nothing here can fail or alter an operation.
//!
//! ```ignore
//! use recordgate::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::RecordPersisted, &[("record_type", "label"), ("id", "7")]);
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

/// Severity an event is reported at
pub fn event_severity(event: Event) -> Severity {
    if event.is_failure() {
        Severity::Error
    } else if event == Event::RecordRejected {
        Severity::Warn
    } else if event == Event::RecordValidated {
        Severity::Trace
    } else {
        Severity::Info
    }
}

/// Log a lifecycle event
pub fn log_event(event: Event) {
    Logger::log(event_severity(event), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event_severity(event), event.as_str(), fields);
}
