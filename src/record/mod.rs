//! Record instances
//!
//! A `Record` is one row of application data: a type tag, an optional
//! storage-assigned identity, and a map of field values. Records are owned
//! by whoever built them; only the store hands out identities.

mod instance;
mod reference;

pub use instance::Record;
pub use reference::{RecordId, RecordRef};
