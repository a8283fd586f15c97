//! Record repository
//!
//! The single entry point applications use to build, validate, persist,
//! destroy and navigate records.
//!
//! # Invariants
//!
//! - An invalid record is never persisted
//! - Uniqueness holds in storage even under concurrent saves
//! - A destroy removes the full cascade set or nothing
//! - Validation never writes to the store

mod errors;
mod repository;

pub use errors::{RepoError, RepoResult};
pub use repository::{DestroyReport, Repository};
