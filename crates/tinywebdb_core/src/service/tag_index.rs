//! Maintenance of the `*all_tags*` index record.
//!
//! # Responsibility
//! - Keep the index value equal to the sorted set of regular tags.
//! - Repair the index from a full scan when it has drifted.
//!
//! # Invariants
//! - The index value is a JSON list of strings in ascending order with no
//!   duplicates.
//! - Reset writes `[]`; the index record itself is never deleted.
//! - Writes happen only when the tag set actually changes, except for
//!   `reset_index`, `add_all_to_index` and `rebuild_index`, which always
//!   persist.
//!
//! Callers that pair an index change with an entry change wrap both in
//! `EntryStore::in_transaction`.

use crate::codec::encode;
use crate::model::tag::{TagKind, ALL_TAGS_TAG};
use crate::model::value::TagValue;
use crate::repo::entry_repo::{EntryStore, RepoError, RepoResult};
use log::{debug, info};

/// Returns the indexed tags, or an empty list when no index record exists.
pub fn current_index<S: EntryStore>(store: &S) -> RepoResult<Vec<String>> {
    Ok(load_index(store)?.unwrap_or_default())
}

/// Inserts `tag` into the index. Returns `false` when it was already present.
pub fn add_to_index<S: EntryStore>(store: &S, tag: &str) -> RepoResult<bool> {
    let mut tags = load_index(store)?.unwrap_or_default();
    if tags.iter().any(|indexed| indexed == tag) {
        return Ok(false);
    }

    tags.push(tag.to_string());
    tags.sort();
    persist_index(store, &tags)?;
    debug!(
        "event=index_add module=index status=ok indexed_count={}",
        tags.len()
    );
    Ok(true)
}

/// Merges many tags into the index with a single sort and write.
///
/// Returns how many tags were new.
pub fn add_all_to_index<S, I>(store: &S, new_tags: I) -> RepoResult<usize>
where
    S: EntryStore,
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut tags = load_index(store)?.unwrap_or_default();
    let before = tags.len();
    for tag in new_tags {
        let tag = tag.as_ref();
        if !tags.iter().any(|indexed| indexed == tag) {
            tags.push(tag.to_string());
        }
    }
    tags.sort();
    persist_index(store, &tags)?;

    let added = tags.len() - before;
    debug!(
        "event=index_merge module=index status=ok added={} indexed_count={}",
        added,
        tags.len()
    );
    Ok(added)
}

/// Removes `tag` from the index. Returns `false` when it was not indexed.
pub fn remove_from_index<S: EntryStore>(store: &S, tag: &str) -> RepoResult<bool> {
    let Some(mut tags) = load_index(store)? else {
        return Ok(false);
    };
    let before = tags.len();
    tags.retain(|indexed| indexed != tag);
    if tags.len() == before {
        return Ok(false);
    }

    persist_index(store, &tags)?;
    debug!(
        "event=index_remove module=index status=ok indexed_count={}",
        tags.len()
    );
    Ok(true)
}

/// Writes an empty index.
pub fn reset_index<S: EntryStore>(store: &S) -> RepoResult<()> {
    persist_index(store, &[])
}

/// Recomputes the index from the regular entries actually present.
pub fn rebuild_index<S: EntryStore>(store: &S) -> RepoResult<Vec<String>> {
    let tags: Vec<String> = store
        .scan_all_ordered_by_tag()?
        .into_iter()
        .filter(|entry| TagKind::classify(&entry.tag) == TagKind::Regular)
        .map(|entry| entry.tag)
        .collect();
    persist_index(store, &tags)?;
    info!(
        "event=index_rebuild module=index status=ok indexed_count={}",
        tags.len()
    );
    Ok(tags)
}

fn load_index<S: EntryStore>(store: &S) -> RepoResult<Option<Vec<String>>> {
    match store.get_by_tag(ALL_TAGS_TAG)? {
        Some(entry) => parse_index_text(&entry.value).map(Some),
        None => Ok(None),
    }
}

fn parse_index_text(text: &str) -> RepoResult<Vec<String>> {
    serde_json::from_str::<Vec<String>>(text).map_err(|err| {
        RepoError::InvalidData(format!(
            "index record `{ALL_TAGS_TAG}` is not a list of tags: {err}"
        ))
    })
}

fn persist_index<S: EntryStore>(store: &S, tags: &[String]) -> RepoResult<()> {
    let text = encode(&TagValue::string_list(tags.iter().cloned()));
    store.upsert(ALL_TAGS_TAG, &text)
}
