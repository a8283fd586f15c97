//! Fault point injection for testing atomicity
//!
//! A fault point is a named location inside a store write. When armed, the
//! store fails the write at that point and must leave no partial state.
//!
//! Points are armed either per store through a `FaultInjector`, or process
//! wide through the `RECORDGATE_FAULT_POINT` environment variable.
//!
//! ```ignore
//! let store = MemoryStore::for_registry(&registry);
//! store.faults().arm(fault::points::DESTROY_AFTER_FIRST_REMOVE);
//! assert!(store.commit_destroy(&refs).is_err());
//! ```

use std::collections::HashSet;
use std::sync::{Mutex, OnceLock};

/// Cache the env fault point to avoid repeated env var lookups
static ENV_FAULT_POINT: OnceLock<Option<String>> = OnceLock::new();

#[inline]
fn env_fault_point() -> Option<&'static str> {
    ENV_FAULT_POINT
        .get_or_init(|| std::env::var("RECORDGATE_FAULT_POINT").ok())
        .as_deref()
}

/// Returns true if `RECORDGATE_FAULT_POINT` equals the given name.
#[inline]
pub fn env_fault_enabled(name: &str) -> bool {
    env_fault_point().map(|p| p == name).unwrap_or(false)
}

/// Per-store set of armed fault points
#[derive(Debug, Default)]
pub struct FaultInjector {
    armed: Mutex<HashSet<&'static str>>,
}

impl FaultInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a point until it is disarmed
    pub fn arm(&self, name: &'static str) {
        self.with_armed(|armed| {
            armed.insert(name);
        });
    }

    pub fn disarm(&self, name: &'static str) {
        self.with_armed(|armed| {
            armed.remove(name);
        });
    }

    pub fn disarm_all(&self) {
        self.with_armed(HashSet::clear);
    }

    /// Returns true if the write at `name` must fail
    pub fn triggered(&self, name: &str) -> bool {
        env_fault_enabled(name) || self.with_armed(|armed| armed.contains(name))
    }

    fn with_armed<R>(&self, f: impl FnOnce(&mut HashSet<&'static str>) -> R) -> R {
        // A poisoned set is still a valid set of names
        let mut guard = match self.armed.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }
}

/// All defined fault point names
pub mod points {
    /// Before a commit touches any table
    pub const COMMIT_BEFORE_WRITE: &str = "commit_before_write";
    /// After the first record of a destroy set has been removed
    pub const DESTROY_AFTER_FIRST_REMOVE: &str = "destroy_after_first_remove";

    /// Get all fault point names
    pub fn all() -> &'static [&'static str] {
        &[COMMIT_BEFORE_WRITE, DESTROY_AFTER_FIRST_REMOVE]
    }
}
