//! Association resolution
//!
//! Typed relationships between record types, resolved through the store.
//!
//! # Design Principles
//!
//! - Optional associations resolve to an explicit "no value"
//! - Polymorphic targets are (type tag, id) pairs dispatched through the registry
//! - One-to-one resolution never silently picks one of several candidates
//! - Cascade sets are planned here and committed atomically by the store

mod errors;
mod resolver;

pub use errors::{AssociationError, AssociationResult};
pub use resolver::{AssociationResolver, Resolved};
