//! Read-only aggregate views over the regular entries.
//!
//! # Responsibility
//! - Compute the `*all_values*`, `*all_timestamps*` and `*all_entries*`
//!   projections from one ordered scan.
//! - Expose the rows an admin table renderer needs.
//!
//! # Invariants
//! - Every projection is in ascending tag order and excludes reserved tags.
//! - A stored value that is not valid JSON is surfaced as its raw text.

use crate::codec::{decode, escape_text};
use crate::model::entry::{format_timestamp, Entry};
use crate::model::tag::{AggregateView, TagKind, ALL_TAGS_TAG};
use crate::model::value::TagValue;
use crate::repo::entry_repo::{EntryStore, RepoResult};

/// Regular entries in ascending tag order.
pub fn regular_entries<S: EntryStore>(store: &S) -> RepoResult<Vec<Entry>> {
    Ok(store
        .scan_all_ordered_by_tag()?
        .into_iter()
        .filter(|entry| TagKind::classify(&entry.tag) == TagKind::Regular)
        .collect())
}

/// Decoded value of every regular entry.
pub fn all_values<S: EntryStore>(store: &S) -> RepoResult<Vec<TagValue>> {
    Ok(regular_entries(store)?
        .iter()
        .map(|entry| decode(&entry.value).value)
        .collect())
}

/// Formatted last-write time of every regular entry.
pub fn all_timestamps<S: EntryStore>(store: &S) -> RepoResult<Vec<String>> {
    Ok(regular_entries(store)?
        .iter()
        .map(Entry::timestamp_text)
        .collect())
}

/// `[tag, value, timestamp]` triple for every regular entry.
pub fn all_entries<S: EntryStore>(store: &S) -> RepoResult<Vec<TagValue>> {
    Ok(regular_entries(store)?
        .into_iter()
        .map(|entry| {
            let timestamp = entry.timestamp_text();
            let value = decode(&entry.value).value;
            TagValue::List(vec![
                TagValue::String(entry.tag),
                value,
                TagValue::String(timestamp),
            ])
        })
        .collect())
}

/// Computes `view` as a single list value.
pub fn view_value<S: EntryStore>(store: &S, view: AggregateView) -> RepoResult<TagValue> {
    let value = match view {
        AggregateView::Values => TagValue::List(all_values(store)?),
        AggregateView::Timestamps => TagValue::string_list(all_timestamps(store)?),
        AggregateView::Entries => TagValue::List(all_entries(store)?),
    };
    Ok(value)
}

/// One line of the admin table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    /// Markup-escaped tag.
    pub tag: String,
    /// Markup-escaped stored text, or a description for computed views.
    pub value: String,
    /// Formatted last-write time; empty for computed views.
    pub timestamp: String,
    /// Whether the renderer should offer a delete action.
    pub deletable: bool,
}

/// Rows for the admin table: the index, the three views, then every
/// regular entry.
pub fn table_rows<S: EntryStore>(store: &S) -> RepoResult<Vec<TableRow>> {
    let index_row = match store.get_by_tag(ALL_TAGS_TAG)? {
        Some(entry) => TableRow {
            tag: escape_text(&entry.tag),
            value: escape_text(&entry.value),
            timestamp: format_timestamp(entry.updated_at),
            deletable: true,
        },
        None => TableRow {
            tag: escape_text(ALL_TAGS_TAG),
            value: "[]".to_string(),
            timestamp: String::new(),
            deletable: true,
        },
    };

    let mut rows = vec![index_row];
    for view in [
        AggregateView::Values,
        AggregateView::Timestamps,
        AggregateView::Entries,
    ] {
        rows.push(TableRow {
            tag: escape_text(view.tag()),
            value: view_description(view).to_string(),
            timestamp: String::new(),
            deletable: false,
        });
    }

    rows.extend(regular_entries(store)?.into_iter().map(|entry| TableRow {
        tag: escape_text(&entry.tag),
        value: escape_text(&entry.value),
        timestamp: entry.timestamp_text(),
        deletable: true,
    }));
    Ok(rows)
}

fn view_description(view: AggregateView) -> &'static str {
    match view {
        AggregateView::Values => "A list of all values, in the same order as all tags",
        AggregateView::Timestamps => "A list of all timestamps, in the same order as all tags",
        AggregateView::Entries => "A list of all tag/value/timestamp triples",
    }
}
