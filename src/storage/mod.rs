//! Storage boundary
//!
//! The persisted-record store consumed by validation and association
//! resolution. The store, not the validator, is the final authority on
//! uniqueness.
//!
//! # Design Principles
//!
//! - One trait (`RecordStore`) at the persistence seam
//! - Commit and destroy are atomic units
//! - Uniqueness re-checked under the write lock on every commit
//! - Ids assigned by the store, never reused
//!
//! # Invariants Enforced
//!
//! - A commit that would break a uniqueness constraint writes nothing
//! - A destroy set is removed entirely or not at all

mod errors;
mod memory;
mod store;

pub use errors::{StorageError, StorageResult};
pub use memory::MemoryStore;
pub use store::{Clause, RecordStore, ScopePredicate};
