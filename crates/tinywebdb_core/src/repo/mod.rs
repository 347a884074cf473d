//! Repository layer over the tag/value table.
//!
//! # Responsibility
//! - Define the backend contract the store services are written against.
//! - Keep SQL details out of mutation policy and view code.
//!
//! # Invariants
//! - Single-record primitives are individually atomic.
//! - Multi-record changes go through `EntryStore::in_transaction`.

pub mod entry_repo;
