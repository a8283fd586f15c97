//! Index subsystem
//!
//! Indexes are derived, in-memory-only state owned by the store.
//!
//! # Design Principles
//!
//! - Derived state: indexes mirror stored records, never the source of truth
//! - Deterministic: BTreeMap iteration order, sorted ids
//!
//! # Invariants
//!
//! - Index updates happen under the same lock as the table write
//! - Null ruled values are never indexed

mod btree;
mod unique;

pub use btree::{IndexKey, IndexTree};
pub use unique::UniqueIndex;
