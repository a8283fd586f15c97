//! Observable lifecycle events
//!
//! Events are explicit and typed; the logger only ever sees their string form.

use std::fmt;

/// Observable events in the record lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Startup
    /// Configuration loaded
    ConfigLoaded,
    /// Record type descriptors loaded and verified
    SchemasLoaded,

    // Record lifecycle
    /// Validation pass finished (valid or not)
    RecordValidated,
    /// Save refused because of validation errors
    RecordRejected,
    /// Insert or update committed
    RecordPersisted,
    /// Record and its cascade set removed
    RecordDestroyed,
    /// Cascade destroy could not complete; nothing was removed
    CascadeDestroyFailed,
    /// Storage refused a commit for a reason other than validation
    CommitFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::SchemasLoaded => "SCHEMAS_LOADED",
            Event::RecordValidated => "RECORD_VALIDATED",
            Event::RecordRejected => "RECORD_REJECTED",
            Event::RecordPersisted => "RECORD_PERSISTED",
            Event::RecordDestroyed => "RECORD_DESTROYED",
            Event::CascadeDestroyFailed => "CASCADE_DESTROY_FAILED",
            Event::CommitFailed => "COMMIT_FAILED",
        }
    }

    /// Returns true if this event reports a failed operation
    pub fn is_failure(&self) -> bool {
        matches!(self, Event::CascadeDestroyFailed | Event::CommitFailed)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
