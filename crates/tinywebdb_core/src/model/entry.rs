//! Persisted entry record.

use chrono::{DateTime, Utc};

use super::tag::ALL_TAGS_TAG;

/// `MM/DD/YYYY HH:MM:SS`, the instant format clients parse.
pub const TIMESTAMP_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// One row of the tag/value table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Unique, case-sensitive key.
    pub tag: String,
    /// JSON text of the stored value.
    pub value: String,
    /// Last write time in epoch milliseconds, maintained by the backend.
    pub updated_at: i64,
}

impl Entry {
    /// Returns whether this row is the `*all_tags*` index record.
    pub fn is_index(&self) -> bool {
        self.tag == ALL_TAGS_TAG
    }

    /// Last write time rendered in the client timestamp format.
    pub fn timestamp_text(&self) -> String {
        format_timestamp(self.updated_at)
    }
}

/// Renders epoch milliseconds as UTC `MM/DD/YYYY HH:MM:SS`.
///
/// Out-of-range instants render as an empty string.
pub fn format_timestamp(epoch_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(epoch_ms)
        .map(|instant| instant.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{format_timestamp, Entry};

    #[test]
    fn timestamp_is_zero_padded_24_hour() {
        // 2011-12-04 07:05:09 UTC
        assert_eq!(format_timestamp(1_322_982_309_000), "12/04/2011 07:05:09");
        // 2014-11-24 21:30:00 UTC
        assert_eq!(format_timestamp(1_416_864_600_000), "11/24/2014 21:30:00");
    }

    #[test]
    fn out_of_range_timestamp_renders_empty() {
        assert_eq!(format_timestamp(i64::MAX), "");
    }

    #[test]
    fn index_record_is_detected_by_tag() {
        let entry = Entry {
            tag: "*all_tags*".to_string(),
            value: "[]".to_string(),
            updated_at: 0,
        };
        assert!(entry.is_index());
    }
}
