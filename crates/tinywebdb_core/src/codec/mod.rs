//! JSON interchange adapter for stored values.
//!
//! # Responsibility
//! - Decode client value text, falling back to a plain string when the text
//!   is not JSON.
//! - Encode decoded values back to compact JSON text for storage.
//! - Apply the response-only shims: top-level string quoting and markup
//!   escaping for the web form path.
//!
//! # Invariants
//! - `decode` and `encode` never fail.
//! - `decode(&encode(v)).value == v` for every value `decode` can produce.
//! - Shims are applied to responses only, never to stored text.

use crate::model::value::TagValue;
use serde_json::Value as JsonValue;

/// Result of decoding client-supplied value text.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub value: TagValue,
    /// `true` when the text was not JSON and was kept verbatim as a string.
    pub fallback_used: bool,
}

/// Decodes `text` as JSON, or keeps it verbatim as a string.
pub fn decode(text: &str) -> Decoded {
    match serde_json::from_str::<TagValue>(text) {
        Ok(value) => Decoded {
            value,
            fallback_used: false,
        },
        Err(_) => Decoded {
            value: TagValue::string(text),
            fallback_used: true,
        },
    }
}

/// Encodes `value` as compact JSON text.
pub fn encode(value: &TagValue) -> String {
    JsonValue::from(value.clone()).to_string()
}

/// Wraps an outermost string in literal double quotes.
///
/// Deployed clients strip one level of quoting from top-level string results,
/// so `hello` must go out as `"hello"`. Strings nested in lists or maps are
/// left alone.
pub fn quote_top_level_string(value: TagValue) -> TagValue {
    match value {
        TagValue::String(text) => TagValue::String(format!("\"{text}\"")),
        other => other,
    }
}

/// Escapes `&`, `<` and `>` in every string inside `value`.
///
/// Map keys are kept as-is.
pub fn escape_markup(value: &TagValue) -> TagValue {
    match value {
        TagValue::String(text) => TagValue::String(escape_text(text)),
        TagValue::List(items) => TagValue::List(items.iter().map(escape_markup).collect()),
        TagValue::Map(fields) => TagValue::Map(
            fields
                .iter()
                .map(|(key, field)| (key.clone(), escape_markup(field)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Escapes markup-significant characters in plain text.
pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::{decode, encode, escape_markup, escape_text, quote_top_level_string};
    use crate::model::value::TagValue;

    #[test]
    fn decode_accepts_json_values() {
        let decoded = decode(r#"[1, "two"]"#);
        assert!(!decoded.fallback_used);
        assert_eq!(
            decoded.value,
            TagValue::List(vec![TagValue::from(1), TagValue::string("two")])
        );
        assert_eq!(decode(" \"red\" ").value, TagValue::string("red"));
    }

    #[test]
    fn decode_falls_back_to_raw_string() {
        let decoded = decode("red apple");
        assert!(decoded.fallback_used);
        assert_eq!(decoded.value, TagValue::string("red apple"));

        let empty = decode("");
        assert!(empty.fallback_used);
        assert_eq!(empty.value, TagValue::string(""));
    }

    #[test]
    fn bare_and_quoted_sentinel_decode_alike() {
        assert_eq!(decode("*delete*").value, decode("\"*delete*\"").value);
    }

    #[test]
    fn encode_then_decode_preserves_value() {
        for text in [
            r#"{"b": [1, 2.5, null], "a": {"x": true}}"#,
            r#""line\nbreak""#,
            "-0.25",
            "not json at all",
        ] {
            let value = decode(text).value;
            let again = decode(&encode(&value));
            assert!(!again.fallback_used);
            assert_eq!(again.value, value);
        }
    }

    #[test]
    fn integers_beyond_64_bits_keep_every_digit() {
        for literal in ["12345678901234567890123", "18446744073709551616", "-9223372036854775809"] {
            let decoded = decode(literal);
            assert!(!decoded.fallback_used);
            assert_eq!(encode(&decoded.value), literal);
        }
        assert_eq!(encode(&decode("[1, 2.5, -3]").value), "[1,2.5,-3]");
    }

    #[test]
    fn quoting_applies_to_top_level_strings_only() {
        assert_eq!(
            quote_top_level_string(TagValue::string("hello")),
            TagValue::string("\"hello\"")
        );
        let nested = TagValue::List(vec![TagValue::from(1), TagValue::string("two")]);
        assert_eq!(quote_top_level_string(nested.clone()), nested);
        assert_eq!(quote_top_level_string(TagValue::Null), TagValue::Null);
    }

    #[test]
    fn escape_markup_reaches_nested_strings() {
        let value = decode(r#"{"<k>": ["a<b", {"c": "x & y"}], "n": 3}"#).value;
        let escaped = escape_markup(&value);
        assert_eq!(
            encode(&escaped),
            r#"{"<k>":["a&lt;b",{"c":"x &amp; y"}],"n":3}"#
        );
        assert_eq!(escape_text("<b>"), "&lt;b&gt;");
    }
}
