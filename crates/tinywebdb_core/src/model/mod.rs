//! Domain model for the tag/value store.
//!
//! # Responsibility
//! - Define the persisted entry shape and the decoded value variant.
//! - Name the reserved tags and the delete sentinel shared with clients.
//!
//! # Invariants
//! - Reserved literals are byte-identical to what existing clients send.
//! - Stored values are always JSON text; decoding happens at the edges.

pub mod entry;
pub mod tag;
pub mod value;
