//! Reserved tags and tag classification.
//!
//! These literals are a wire contract with deployed clients and must never
//! change.

/// Index tag. Its value is the sorted list of every regular tag.
pub const ALL_TAGS_TAG: &str = "*all_tags*";
/// Read-only view: every value, ordered by tag.
pub const ALL_VALUES_TAG: &str = "*all_values*";
/// Read-only view: every timestamp, ordered by tag.
pub const ALL_TIMESTAMPS_TAG: &str = "*all_timestamps*";
/// Read-only view: every `[tag, value, timestamp]` triple, ordered by tag.
pub const ALL_ENTRIES_TAG: &str = "*all_entries*";
/// Storing this value deletes the tag instead of writing it.
pub const DELETE_SENTINEL: &str = "*delete*";

/// All reserved tags, index first.
pub const RESERVED_TAGS: [&str; 4] = [
    ALL_TAGS_TAG,
    ALL_VALUES_TAG,
    ALL_TIMESTAMPS_TAG,
    ALL_ENTRIES_TAG,
];

/// Computed read-only projection over the regular entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateView {
    Values,
    Timestamps,
    Entries,
}

impl AggregateView {
    /// Reserved tag that addresses this view.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Values => ALL_VALUES_TAG,
            Self::Timestamps => ALL_TIMESTAMPS_TAG,
            Self::Entries => ALL_ENTRIES_TAG,
        }
    }
}

/// What a tag addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// The `*all_tags*` control tag.
    Index,
    /// One of the read-only aggregate views.
    View(AggregateView),
    /// Ordinary user data.
    Regular,
}

impl TagKind {
    /// Classifies `tag`. Matching is exact and case-sensitive.
    pub fn classify(tag: &str) -> Self {
        match tag {
            ALL_TAGS_TAG => Self::Index,
            ALL_VALUES_TAG => Self::View(AggregateView::Values),
            ALL_TIMESTAMPS_TAG => Self::View(AggregateView::Timestamps),
            ALL_ENTRIES_TAG => Self::View(AggregateView::Entries),
            _ => Self::Regular,
        }
    }
}

/// Returns whether `tag` is one of the reserved tags.
pub fn is_reserved_tag(tag: &str) -> bool {
    TagKind::classify(tag) != TagKind::Regular
}

#[cfg(test)]
mod tests {
    use super::{is_reserved_tag, AggregateView, TagKind, RESERVED_TAGS};

    #[test]
    fn classify_recognizes_every_reserved_tag() {
        assert_eq!(TagKind::classify("*all_tags*"), TagKind::Index);
        assert_eq!(
            TagKind::classify("*all_entries*"),
            TagKind::View(AggregateView::Entries)
        );
        for tag in RESERVED_TAGS {
            assert!(is_reserved_tag(tag), "{tag} should be reserved");
        }
    }

    #[test]
    fn classify_is_case_sensitive() {
        assert_eq!(TagKind::classify("*ALL_TAGS*"), TagKind::Regular);
        assert_eq!(TagKind::classify("all_values"), TagKind::Regular);
    }

    #[test]
    fn view_tag_maps_back_to_literal() {
        for view in [
            AggregateView::Values,
            AggregateView::Timestamps,
            AggregateView::Entries,
        ] {
            assert_eq!(TagKind::classify(view.tag()), TagKind::View(view));
        }
    }
}
