//! recordgate - Record validation and association registry
//!
//! Declared record types, accumulated field validation, typed associations
//! with atomic cascade destroy, and storage-enforced uniqueness.

pub mod association;
pub mod config;
pub mod fault;
pub mod index;
pub mod models;
pub mod observability;
pub mod record;
pub mod refs;
pub mod repo;
pub mod schema;
pub mod storage;
pub mod token;
