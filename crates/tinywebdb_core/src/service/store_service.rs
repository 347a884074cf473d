//! Store/get use-case service.
//!
//! # Responsibility
//! - Apply the mutation policy for `store`: regular upsert, sentinel delete,
//!   reserved-tag rejection.
//! - Resolve `get` against the index, the computed views or one entry.
//! - Build the response envelopes sent back to clients.
//!
//! # Invariants
//! - Entry and index changes for one call commit in one transaction.
//! - `*all_values*`, `*all_timestamps*` and `*all_entries*` are never written.
//! - `*all_tags*` accepts only the delete sentinel.
//! - Deleting an absent tag succeeds and changes nothing.

use crate::codec::{decode, encode, escape_markup, escape_text, quote_top_level_string};
use crate::logging::log_field;
use crate::model::tag::{TagKind, ALL_TAGS_TAG, DELETE_SENTINEL};
use crate::model::value::TagValue;
use crate::repo::entry_repo::{EntryStore, RepoResult};
use crate::service::bulk::{self, ImportError, ImportOutcome};
use crate::service::tag_index;
use crate::service::views::{self, TableRow};
use log::{info, warn};

/// Outcome marker of a store call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreStatus {
    Stored,
    CannotStore,
}

impl StoreStatus {
    /// Wire literal sent as the first response element.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stored => "STORED",
            Self::CannotStore => "CANNOT_STORE",
        }
    }
}

/// Response to a store call, sent as `[status, tag, value]`.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreResponse {
    pub status: StoreStatus,
    pub tag: String,
    pub value: TagValue,
    /// Set when the value text was not JSON and was stored as a string.
    pub warning: Option<String>,
}

impl StoreResponse {
    fn stored(tag: &str, value: TagValue) -> Self {
        Self {
            status: StoreStatus::Stored,
            tag: tag.to_string(),
            value,
            warning: None,
        }
    }

    fn cannot_store(tag: &str, value: TagValue) -> Self {
        Self {
            status: StoreStatus::CannotStore,
            tag: tag.to_string(),
            value,
            warning: None,
        }
    }

    fn deleted(tag: &str) -> Self {
        Self::stored(tag, TagValue::string(DELETE_SENTINEL))
    }

    /// Returns whether the call was accepted.
    pub fn is_stored(&self) -> bool {
        self.status == StoreStatus::Stored
    }

    /// `[status, tag, value]` as a list value.
    pub fn wire_value(&self) -> TagValue {
        TagValue::List(vec![
            TagValue::string(self.status.as_str()),
            TagValue::string(self.tag.as_str()),
            self.value.clone(),
        ])
    }

    /// JSON text of `wire_value`.
    pub fn to_json(&self) -> String {
        encode(&self.wire_value())
    }

    /// Copy with markup escaped in tag, value and warning, for web pages.
    pub fn escaped(&self) -> Self {
        Self {
            status: self.status,
            tag: escape_text(&self.tag),
            value: escape_markup(&self.value),
            warning: self.warning.as_deref().map(escape_text),
        }
    }
}

/// Response to a get call, sent as `["VALUE", tag, value]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueResponse {
    pub tag: String,
    /// Result after top-level string quoting.
    pub value: TagValue,
}

impl ValueResponse {
    /// `["VALUE", tag, value]` as a list value.
    pub fn wire_value(&self) -> TagValue {
        TagValue::List(vec![
            TagValue::string("VALUE"),
            TagValue::string(self.tag.as_str()),
            self.value.clone(),
        ])
    }

    /// JSON text of `wire_value`.
    pub fn to_json(&self) -> String {
        encode(&self.wire_value())
    }

    /// Copy with markup escaped in tag and value, for web pages.
    pub fn escaped(&self) -> Self {
        Self {
            tag: escape_text(&self.tag),
            value: escape_markup(&self.value),
        }
    }
}

/// Use-case service over an entry store.
pub struct TagStoreService<S: EntryStore> {
    store: S,
}

impl<S: EntryStore> TagStoreService<S> {
    /// Creates a service using the provided store implementation.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Borrows the underlying entry store.
    pub fn entry_store(&self) -> &S {
        &self.store
    }

    /// Stores `raw_value` (JSON text, or anything else as a plain string)
    /// under `tag`.
    ///
    /// # Contract
    /// - View tags return `CANNOT_STORE` without touching storage.
    /// - A value equal to `*delete*` routes to [`Self::delete`].
    /// - `*all_tags*` with any other value returns `CANNOT_STORE`.
    /// - Otherwise the tag is indexed and the value upserted.
    pub fn store(&self, tag: &str, raw_value: &str) -> RepoResult<StoreResponse> {
        let decoded = decode(raw_value);
        let kind = TagKind::classify(tag);

        if let TagKind::View(_) = kind {
            warn!(
                "event=store module=service status=rejected reason=read_only_view tag={}",
                log_field(tag)
            );
            return Ok(StoreResponse::cannot_store(tag, decoded.value));
        }

        if decoded.value.as_str() == Some(DELETE_SENTINEL) {
            return self.delete(tag);
        }

        if kind == TagKind::Index {
            warn!(
                "event=store module=service status=rejected reason=index_requires_sentinel tag={}",
                log_field(tag)
            );
            return Ok(StoreResponse::cannot_store(tag, decoded.value));
        }

        let warning = if decoded.fallback_used {
            warn!(
                "event=value_decode module=service status=fallback tag={} value_len={}",
                log_field(tag),
                raw_value.len()
            );
            Some(fallback_note(raw_value))
        } else {
            None
        };

        let text = encode(&decoded.value);
        self.store.in_transaction(|store| {
            tag_index::add_to_index(store, tag)?;
            store.upsert(tag, &text)
        })?;
        info!(
            "event=store module=service status=ok tag={} kind={} value_len={}",
            log_field(tag),
            decoded.value.kind_name(),
            text.len()
        );

        let mut response = StoreResponse::stored(tag, decoded.value);
        response.warning = warning;
        Ok(response)
    }

    /// Deletes `tag`; `*all_tags*` deletes every regular entry.
    ///
    /// # Contract
    /// - Absent tags succeed without changes.
    /// - Delete-all leaves the index record in place with value `[]`.
    /// - View tags return `CANNOT_STORE`.
    pub fn delete(&self, tag: &str) -> RepoResult<StoreResponse> {
        match TagKind::classify(tag) {
            TagKind::View(_) => {
                warn!(
                    "event=delete module=service status=rejected reason=read_only_view tag={}",
                    log_field(tag)
                );
                Ok(StoreResponse::cannot_store(
                    tag,
                    TagValue::string(DELETE_SENTINEL),
                ))
            }
            TagKind::Index => {
                let removed = self.store.in_transaction(|store| {
                    let mut removed = 0usize;
                    for entry in store.scan_all_ordered_by_tag()? {
                        if entry.is_index() {
                            continue;
                        }
                        if store.delete_by_tag(&entry.tag)? {
                            removed += 1;
                        }
                    }
                    tag_index::reset_index(store)?;
                    Ok(removed)
                })?;
                info!("event=delete_all module=service status=ok removed={removed}");
                Ok(StoreResponse::deleted(ALL_TAGS_TAG))
            }
            TagKind::Regular => {
                let existed = self.store.in_transaction(|store| {
                    let existed = store.delete_by_tag(tag)?;
                    tag_index::remove_from_index(store, tag)?;
                    Ok(existed)
                })?;
                info!(
                    "event=delete module=service status=ok tag={} existed={existed}",
                    log_field(tag)
                );
                Ok(StoreResponse::deleted(tag))
            }
        }
    }

    /// Reads `tag`.
    ///
    /// # Contract
    /// - `*all_tags*` yields the index list, `[]` when absent.
    /// - View tags yield the computed view.
    /// - Absent regular tags yield `""`.
    /// - A top-level string result is wrapped in extra quotes.
    pub fn get(&self, tag: &str) -> RepoResult<ValueResponse> {
        let value = match TagKind::classify(tag) {
            TagKind::Index => TagValue::string_list(tag_index::current_index(&self.store)?),
            TagKind::View(view) => views::view_value(&self.store, view)?,
            TagKind::Regular => match self.store.get_by_tag(tag)? {
                Some(entry) => decode(&entry.value).value,
                None => TagValue::string(""),
            },
        };
        info!(
            "event=get module=service status=ok tag={} kind={}",
            log_field(tag),
            value.kind_name()
        );

        Ok(ValueResponse {
            tag: tag.to_string(),
            value: quote_top_level_string(value),
        })
    }

    /// Current index list.
    pub fn current_index(&self) -> RepoResult<Vec<String>> {
        tag_index::current_index(&self.store)
    }

    /// Recomputes the index from the stored entries.
    pub fn rebuild_index(&self) -> RepoResult<Vec<String>> {
        self.store.in_transaction(tag_index::rebuild_index)
    }

    /// Parses, validates and merges a bulk payload.
    pub fn import_text(&self, payload: &str) -> Result<ImportOutcome, ImportError> {
        let pairs = bulk::parse_import_payload(payload)?;
        let outcome = bulk::import_all(&self.store, pairs)?;
        Ok(outcome)
    }

    /// Plain-text list of every regular `[tag, value]` pair.
    pub fn export_all(&self) -> RepoResult<String> {
        bulk::export_all(&self.store)
    }

    /// Admin table rows.
    pub fn table_rows(&self) -> RepoResult<Vec<TableRow>> {
        views::table_rows(&self.store)
    }
}

fn fallback_note(raw_value: &str) -> String {
    format!(
        "{raw_value} is not in JSON form. Treating it as if it were entered as \"{raw_value}\"."
    )
}
