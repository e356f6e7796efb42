//! Deterministic identifiers for sources and items.
//!
//! Ids are persisted by consumers and used for upserts, so the format is
//! fixed: `<type>-<userId>-<columnId>-<md5>` for sources and
//! `<sourceId>-<md5>` for items. The md5 is only a stable fingerprint.

use md5::{Digest, Md5};

use crate::domain::SourceType;

/// Lower-case hex md5 of the raw UTF-8 bytes of `input`.
pub fn fingerprint(input: &str) -> String {
    hex::encode(Md5::digest(input.as_bytes()))
}

pub fn source_id(source_type: SourceType, user_id: &str, column_id: &str, canonical: &str) -> String {
    format!(
        "{}-{}-{}-{}",
        source_type.as_str(),
        user_id,
        column_id,
        fingerprint(canonical)
    )
}

pub fn item_id(source_id: &str, entry_identifier: &str) -> String {
    format!("{}-{}", source_id, fingerprint(entry_identifier))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_known_value() {
        assert_eq!(fingerprint(""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(
            fingerprint("https://example.com/feed.xml"),
            hex::encode(Md5::digest(b"https://example.com/feed.xml"))
        );
    }

    #[test]
    fn test_source_id_format() {
        let id = source_id(SourceType::Rss, "u", "c", "https://example.com/feed.xml");
        let (prefix, hash) = id.split_at("rss-u-c-".len());
        assert_eq!(prefix, "rss-u-c-");
        assert_eq!(hash.len(), 32);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_source_id_deterministic() {
        let a = source_id(SourceType::Reddit, "user", "col", "https://www.reddit.com/r/rust.rss");
        let b = source_id(SourceType::Reddit, "user", "col", "https://www.reddit.com/r/rust.rss");
        assert_eq!(a, b);
    }

    #[test]
    fn test_source_id_varies_with_inputs() {
        let base = source_id(SourceType::Rss, "u", "c", "https://a");
        assert_ne!(base, source_id(SourceType::Rss, "u", "c", "https://b"));
        assert_ne!(base, source_id(SourceType::Rss, "u", "other", "https://a"));
        assert_ne!(base, source_id(SourceType::Podcast, "u", "c", "https://a"));
    }

    #[test]
    fn test_item_id_format() {
        let id = item_id("rss-u-c-abc", "guid-1");
        assert_eq!(id, format!("rss-u-c-abc-{}", fingerprint("guid-1")));
    }

    #[test]
    fn test_fingerprint_is_byte_exact() {
        // No unicode normalization: composed and decomposed forms differ.
        assert_ne!(fingerprint("caf\u{e9}"), fingerprint("cafe\u{301}"));
    }
}
