//! Thin wrapper around `feed_rs` plus entry accessors shared by the adapters.

use chrono::{DateTime, Utc};
use feed_rs::model::{Entry, Feed};
use feed_rs::parser;
use html_escape::decode_html_entities;

use crate::app::{AppContext, Result, TributaryError};
use crate::fetcher::{fetch_ok, Request};

/// Parse RSS 0.9x/1.0/2.0, Atom or JSON Feed bytes.
///
/// Entries without a guid keep an empty id instead of a synthetic one, so
/// callers can fall back to the entry link.
pub fn parse(body: &[u8]) -> Result<Feed> {
    parser::Builder::new()
        .id_generator(|_, _, _| String::new())
        .build()
        .parse(body)
        .map_err(|e| TributaryError::FeedGetAndParse(e.to_string()))
}

/// Fetch `url` with the primary timeout and parse it as a feed.
pub async fn get_and_parse(ctx: &AppContext, url: &str) -> Result<Feed> {
    let response = fetch_ok(
        &*ctx.fetcher,
        Request::get(url, ctx.config.fetch.timeout()),
    )
    .await?;
    parse(&response.body)
}

/// Parse pre-fetched bytes when given, otherwise fetch `url`.
pub async fn parse_raw_or_fetch(ctx: &AppContext, url: &str, raw: Option<&[u8]>) -> Result<Feed> {
    match raw {
        Some(body) => parse(body),
        None => get_and_parse(ctx, url).await,
    }
}

pub fn feed_title(feed: &Feed) -> Option<String> {
    feed.title
        .as_ref()
        .map(|t| decode_html_entities(t.content.trim()).to_string())
        .filter(|t| !t.is_empty())
}

pub fn feed_link(feed: &Feed) -> Option<String> {
    feed.links
        .iter()
        .find(|l| l.rel.as_deref().map_or(true, |rel| rel == "alternate"))
        .or_else(|| feed.links.first())
        .map(|l| l.href.clone())
}

/// The feed's own icon, else its logo/image.
pub fn feed_icon(feed: &Feed) -> Option<String> {
    feed.icon
        .as_ref()
        .or(feed.logo.as_ref())
        .map(|image| image.uri.clone())
        .filter(|uri| !uri.is_empty())
}

pub fn entry_title(entry: &Entry) -> Option<String> {
    entry
        .title
        .as_ref()
        .map(|t| decode_html_entities(t.content.trim()).to_string())
        .filter(|t| !t.is_empty())
}

pub fn entry_link(entry: &Entry) -> Option<&str> {
    entry
        .links
        .first()
        .map(|l| l.href.as_str())
        .filter(|href| !href.is_empty())
}

/// Published date, else updated date.
pub fn entry_timestamp(entry: &Entry) -> Option<DateTime<Utc>> {
    entry.published.or(entry.updated)
}

/// The native id when present, else the first link.
pub fn entry_identifier(entry: &Entry) -> Option<String> {
    if !entry.id.trim().is_empty() {
        return Some(entry.id.clone());
    }
    entry_link(entry).map(String::from)
}

pub fn entry_author(entry: &Entry) -> Option<String> {
    entry
        .authors
        .iter()
        .map(|a| a.name.trim())
        .find(|name| !name.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test &amp; Feed</title>
    <link>https://example.com</link>
    <description>A test feed</description>
    <item>
      <title>Test Item 1</title>
      <link>https://example.com/item1</link>
      <guid>item-1</guid>
      <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate>
      <author>jane@example.com (Jane)</author>
    </item>
    <item>
      <title>Test Item 2</title>
      <link>https://example.com/item2</link>
    </item>
  </channel>
</rss>"#;

    const ATOM_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Test Feed</title>
  <link rel="self" href="https://example.com/feed.atom"/>
  <link rel="alternate" href="https://example.com/"/>
  <icon>https://example.com/icon.png</icon>
  <entry>
    <title>Atom Entry 1</title>
    <link href="https://example.com/atom1"/>
    <id>atom-entry-1</id>
    <updated>2024-01-01T00:00:00Z</updated>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_rss() {
        let feed = parse(RSS_SAMPLE.as_bytes()).unwrap();
        assert_eq!(feed_title(&feed), Some("Test & Feed".into()));
        assert_eq!(feed.entries.len(), 2);
        assert_eq!(entry_title(&feed.entries[0]), Some("Test Item 1".into()));
        assert_eq!(entry_link(&feed.entries[0]), Some("https://example.com/item1"));
        assert_eq!(
            entry_timestamp(&feed.entries[0]).map(|d| d.timestamp()),
            Some(1_704_067_200)
        );
    }

    #[test]
    fn test_missing_guid_falls_back_to_link() {
        let feed = parse(RSS_SAMPLE.as_bytes()).unwrap();
        assert_eq!(entry_identifier(&feed.entries[0]), Some("item-1".into()));
        assert_eq!(
            entry_identifier(&feed.entries[1]),
            Some("https://example.com/item2".into())
        );
        assert_eq!(entry_timestamp(&feed.entries[1]), None);
    }

    #[test]
    fn test_parse_atom() {
        let feed = parse(ATOM_SAMPLE.as_bytes()).unwrap();
        assert_eq!(feed_title(&feed), Some("Atom Test Feed".into()));
        assert_eq!(feed_link(&feed), Some("https://example.com/".into()));
        assert_eq!(feed_icon(&feed), Some("https://example.com/icon.png".into()));
        assert_eq!(entry_identifier(&feed.entries[0]), Some("atom-entry-1".into()));
        assert!(entry_timestamp(&feed.entries[0]).is_some());
    }

    #[test]
    fn test_parse_error_is_typed() {
        let err = parse(b"<html><body>not a feed</body></html>").unwrap_err();
        assert!(matches!(err, TributaryError::FeedGetAndParse(_)));
    }
}
