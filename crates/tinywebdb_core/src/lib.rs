//! Core domain logic for the TinyWebDB tag/value service.
//! This crate is the single source of truth for store invariants: the
//! `*all_tags*` index, the computed views, sentinel deletes and import
//! validation.

pub mod codec;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, StoreConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::entry::{format_timestamp, Entry};
pub use model::tag::{
    is_reserved_tag, AggregateView, TagKind, ALL_ENTRIES_TAG, ALL_TAGS_TAG, ALL_TIMESTAMPS_TAG,
    ALL_VALUES_TAG, DELETE_SENTINEL,
};
pub use model::value::TagValue;
pub use repo::entry_repo::{EntryStore, RepoError, RepoResult, SqliteEntryStore};
pub use service::bulk::{ImportError, ImportOutcome, ImportStructureError};
pub use service::store_service::{StoreResponse, StoreStatus, TagStoreService, ValueResponse};
pub use service::views::TableRow;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
