//! Bulk import and export of tag/value pairs.
//!
//! # Responsibility
//! - Validate an import payload as a list of `[tag, value]` pairs.
//! - Merge validated pairs into the store with one index write.
//! - Render the regular entries as the plain-text export list.
//!
//! # Invariants
//! - Validation is structural only. Reserved tags and sentinel values pass
//!   `verify` and are dropped by `import_all`, reported in `skipped_tags`.
//! - An import commits all surviving pairs and the index in one transaction.
//! - Export text parses back into a payload that `verify` accepts.

use crate::codec::{decode, encode, escape_markup};
use crate::model::tag::{is_reserved_tag, DELETE_SENTINEL};
use crate::model::value::TagValue;
use crate::repo::entry_repo::{EntryStore, RepoError, RepoResult};
use crate::service::tag_index;
use crate::service::views::regular_entries;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Structural problem found by [`verify`], carrying the offending fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportStructureError {
    /// The payload itself is not a list.
    NotAList(TagValue),
    /// An element of the payload is not a list.
    EntryNotAList(TagValue),
    /// An element is a list but does not have exactly two items.
    EntryNotAPair(TagValue),
    /// The first item of a pair is not a string.
    EntryTagNotAString(TagValue),
}

impl ImportStructureError {
    /// Stable discriminant name.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotAList(_) => "not-a-list",
            Self::EntryNotAList(_) => "entry-not-a-list",
            Self::EntryNotAPair(_) => "entry-not-a-pair",
            Self::EntryTagNotAString(_) => "entry-tag-not-a-string",
        }
    }

    /// The payload or entry that failed validation.
    pub fn fragment(&self) -> &TagValue {
        match self {
            Self::NotAList(value)
            | Self::EntryNotAList(value)
            | Self::EntryNotAPair(value)
            | Self::EntryTagNotAString(value) => value,
        }
    }
}

impl Display for ImportStructureError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAList(_) => write!(
                f,
                "Entries are not a list. They must be a JSON list of tag/value pairs."
            ),
            Self::EntryNotAList(entry) => write!(
                f,
                "Entry is not a list. It must be a two-element list of tag (string) and value. Entry: {}",
                encode(entry)
            ),
            Self::EntryNotAPair(entry) => {
                let len = entry.as_list().map_or(0, <[TagValue]>::len);
                write!(
                    f,
                    "Malformed entry. It must be a two-element list of tag (string) and value, but this entry is a list with {len} elements. Entry: {}",
                    encode(entry)
                )
            }
            Self::EntryTagNotAString(entry) => {
                let tag = entry
                    .as_list()
                    .and_then(|items| items.first())
                    .map(encode)
                    .unwrap_or_default();
                write!(
                    f,
                    "In an entry (tag/value pair), the tag (first element) must be a string, but {tag} is not a string. Entry: {}",
                    encode(entry)
                )
            }
        }
    }
}

impl Error for ImportStructureError {}

/// Bulk import failure.
#[derive(Debug)]
pub enum ImportError {
    /// Nothing was supplied.
    Empty,
    /// The payload is not well-formed JSON.
    MalformedJson(String),
    /// The payload is JSON but not a list of tag/value pairs.
    Structure(ImportStructureError),
    /// Persistence failure while merging.
    Repo(RepoError),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(
                f,
                "Entries list is empty! Perhaps you forgot to choose a file?"
            ),
            Self::MalformedJson(details) => write!(
                f,
                "Entries list is not well-formed JSON. It must be a JSON list of tag/value pairs. ({details})"
            ),
            Self::Structure(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Structure(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Empty | Self::MalformedJson(_) => None,
        }
    }
}

impl From<ImportStructureError> for ImportError {
    fn from(value: ImportStructureError) -> Self {
        Self::Structure(value)
    }
}

impl From<RepoError> for ImportError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Result of merging a validated payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOutcome {
    /// Pairs written to the store, in payload order.
    pub added_entries: Vec<(String, TagValue)>,
    /// Tags dropped because the tag is reserved or the value is `*delete*`.
    pub skipped_tags: Vec<String>,
}

impl ImportOutcome {
    /// Added pairs as an escaped list value, for the import summary page.
    pub fn escaped_entries(&self) -> TagValue {
        escape_markup(&pairs_to_value(&self.added_entries))
    }
}

/// Checks that `payload` is a list of `[string, value]` pairs.
pub fn verify(payload: &TagValue) -> Result<Vec<(String, TagValue)>, ImportStructureError> {
    let TagValue::List(entries) = payload else {
        return Err(ImportStructureError::NotAList(payload.clone()));
    };

    let mut pairs = Vec::with_capacity(entries.len());
    for entry in entries {
        let TagValue::List(items) = entry else {
            return Err(ImportStructureError::EntryNotAList(entry.clone()));
        };
        let [tag, value] = items.as_slice() else {
            return Err(ImportStructureError::EntryNotAPair(entry.clone()));
        };
        let TagValue::String(tag) = tag else {
            return Err(ImportStructureError::EntryTagNotAString(entry.clone()));
        };
        pairs.push((tag.clone(), value.clone()));
    }
    Ok(pairs)
}

/// Parses payload text and verifies its structure.
pub fn parse_import_payload(text: &str) -> Result<Vec<(String, TagValue)>, ImportError> {
    if text.trim().is_empty() {
        return Err(ImportError::Empty);
    }

    let payload = serde_json::from_str::<TagValue>(text).map_err(|err| {
        warn!(
            "event=import_parse module=bulk status=error error_code=malformed_json payload_len={}",
            text.len()
        );
        ImportError::MalformedJson(err.to_string())
    })?;

    verify(&payload).map_err(|err| {
        warn!(
            "event=import_parse module=bulk status=error error_code={}",
            err.kind()
        );
        ImportError::Structure(err)
    })
}

/// Writes validated pairs, skipping reserved tags and sentinel values.
///
/// Later pairs for the same tag overwrite earlier ones.
pub fn import_all<S: EntryStore>(
    store: &S,
    pairs: Vec<(String, TagValue)>,
) -> RepoResult<ImportOutcome> {
    let (added_entries, skipped): (Vec<_>, Vec<_>) = pairs
        .into_iter()
        .partition(|(tag, value)| !is_reserved_tag(tag) && value.as_str() != Some(DELETE_SENTINEL));
    let skipped_tags: Vec<String> = skipped.into_iter().map(|(tag, _)| tag).collect();

    store.in_transaction(|store| {
        tag_index::add_all_to_index(store, added_entries.iter().map(|(tag, _)| tag))?;
        for (tag, value) in &added_entries {
            store.upsert(tag, &encode(value))?;
        }
        Ok(())
    })?;

    info!(
        "event=import module=bulk status=ok added={} skipped={}",
        added_entries.len(),
        skipped_tags.len()
    );
    Ok(ImportOutcome {
        added_entries,
        skipped_tags,
    })
}

/// Renders every regular `[tag, value]` pair, one per line.
pub fn export_all<S: EntryStore>(store: &S) -> RepoResult<String> {
    let pairs: Vec<(String, TagValue)> = regular_entries(store)?
        .into_iter()
        .map(|entry| {
            let value = decode(&entry.value).value;
            (entry.tag, value)
        })
        .collect();
    Ok(format_entry_list(&pairs, "\n"))
}

/// Formats pairs as `[` + one JSON pair per line + `]`.
///
/// `separator` is `"\n"` for text files and `"<br>"` for web pages.
pub fn format_entry_list(pairs: &[(String, TagValue)], separator: &str) -> String {
    let lines: Vec<String> = pairs
        .iter()
        .map(|(tag, value)| {
            encode(&TagValue::List(vec![
                TagValue::string(tag.as_str()),
                value.clone(),
            ]))
        })
        .collect();

    let mut text = String::from("[");
    text.push_str(separator);
    for (index, line) in lines.iter().enumerate() {
        text.push_str(line);
        if index + 1 != lines.len() {
            text.push(',');
        }
        text.push_str(separator);
    }
    text.push(']');
    text
}

fn pairs_to_value(pairs: &[(String, TagValue)]) -> TagValue {
    TagValue::List(
        pairs
            .iter()
            .map(|(tag, value)| TagValue::List(vec![TagValue::string(tag.as_str()), value.clone()]))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::{format_entry_list, verify, ImportError, ImportStructureError};
    use crate::codec::decode;
    use crate::model::value::TagValue;

    fn payload(text: &str) -> TagValue {
        let decoded = decode(text);
        assert!(!decoded.fallback_used, "test payload must be JSON: {text}");
        decoded.value
    }

    #[test]
    fn verify_accepts_pairs() {
        let pairs = verify(&payload(r#"[["a", 1], ["b", [true, null]]]"#)).unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0], ("a".to_string(), TagValue::from(1)));
        assert!(verify(&payload("[]")).unwrap().is_empty());
    }

    #[test]
    fn verify_reports_each_discriminant_with_fragment() {
        let err = verify(&payload("{}")).unwrap_err();
        assert_eq!(err.kind(), "not-a-list");
        assert_eq!(err.fragment(), &payload("{}"));

        let err = verify(&payload(r#"[["a", 1], "b"]"#)).unwrap_err();
        assert_eq!(err, ImportStructureError::EntryNotAList(TagValue::string("b")));

        let err = verify(&payload(r#"[["a", 1], ["b"]]"#)).unwrap_err();
        assert_eq!(err.kind(), "entry-not-a-pair");
        assert_eq!(err.fragment(), &payload(r#"["b"]"#));

        let err = verify(&payload(r#"[[7, "x"]]"#)).unwrap_err();
        assert_eq!(err.kind(), "entry-tag-not-a-string");
        assert!(err.to_string().contains("but 7 is not a string"));
    }

    #[test]
    fn pair_diagnostic_counts_elements() {
        let err = verify(&payload(r#"[["a", 1, 2]]"#)).unwrap_err();
        assert!(err.to_string().contains("a list with 3 elements"));
    }

    #[test]
    fn verify_does_not_filter_reserved_content() {
        let pairs = verify(&payload(r#"[["*all_tags*", 1], ["x", "*delete*"]]"#)).unwrap();
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn entry_list_format_matches_text_export() {
        let pairs = vec![
            ("a".to_string(), TagValue::from(1)),
            ("b".to_string(), TagValue::string("two")),
        ];
        assert_eq!(
            format_entry_list(&pairs, "\n"),
            "[\n[\"a\",1],\n[\"b\",\"two\"]\n]"
        );
        assert_eq!(format_entry_list(&[], "\n"), "[\n]");
    }

    #[test]
    fn empty_and_malformed_payloads_are_distinguished() {
        assert!(matches!(
            super::parse_import_payload("  "),
            Err(ImportError::Empty)
        ));
        assert!(matches!(
            super::parse_import_payload("[[\"a\", 1"),
            Err(ImportError::MalformedJson(_))
        ));
        assert!(matches!(
            super::parse_import_payload("{}"),
            Err(ImportError::Structure(ImportStructureError::NotAList(_)))
        ));
    }
}
