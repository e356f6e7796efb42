//! YouTube channels and playlists through their Atom feeds.
//!
//! Handles (`@name`), custom urls (`/c/name`) and legacy user urls are
//! resolved to a channel id by reading the channel page. Channel icons come
//! from the Data API when a key is configured and are memoized per feed url.

use feed_rs::model::Feed;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use serde::Deserialize;
use url::Url;

use crate::app::{AppContext, Result, TributaryError};
use crate::domain::{Normalized, Source, SourceMeta};
use crate::feed;
use crate::fetcher::{fetch_json, fetch_ok, Request};
use crate::media;
use crate::normalizer::{bare_host, collect_items, finish_source, parse_user_url, path_segments, EntryPolicy};

const FEED_BASE: &str = "https://www.youtube.com/feeds/videos.xml";
const CHANNELS_API: &str = "https://www.googleapis.com/youtube/v3/channels";
const HOSTS: [&str; 3] = ["youtube.com", "m.youtube.com", "music.youtube.com"];

static CHANNEL_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^UC[A-Za-z0-9_-]{22}$").expect("Failed to compile channel id regex"));

static PAGE_CHANNEL_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""(?:channelId|externalId)":"(UC[A-Za-z0-9_-]{22})""#)
        .expect("Failed to compile page channel id regex")
});

/// Where a user input points before any network access.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Feed(String),
    ChannelPage(String),
}

#[derive(Debug, Deserialize)]
struct ChannelsResponse {
    #[serde(default)]
    items: Vec<Channel>,
}

#[derive(Debug, Deserialize)]
struct Channel {
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    thumbnails: Thumbnails,
}

#[derive(Debug, Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

pub async fn normalize(
    ctx: &AppContext,
    source: &Source,
    input: &str,
    raw: Option<&[u8]>,
) -> Result<Normalized> {
    let url = match classify(input)? {
        Target::Feed(url) => url,
        Target::ChannelPage(page) => resolve_channel_page(ctx, &page).await?,
    };
    let parsed = feed::parse_raw_or_fetch(ctx, &url, raw).await?;

    let title = feed::feed_title(&parsed)
        .ok_or_else(|| TributaryError::InvalidFeed(format!("{url} has no title")))?;
    let icon = channel_icon(ctx, &url, &parsed).await;

    let source = finish_source(
        ctx,
        source,
        SourceMeta {
            id: source.id_for(&url),
            title,
            link: feed::feed_link(&parsed),
            icon,
            options: None,
        },
    )
    .await;

    let items = collect_items(&source, &parsed, &EntryPolicy::default(), |entry, mut item| {
        item.media = media::entry_thumbnails(entry).into_iter().next();
        Some(item)
    });

    Ok(Normalized { source, items })
}

/// Map a channel id, handle or youtube url to a feed url, or to the page
/// that has to be read to find the channel id.
pub fn classify(input: &str) -> Result<Target> {
    let input = input.trim();
    let invalid = || TributaryError::validation(format!("{input} is not a YouTube channel or playlist"));

    if CHANNEL_ID.is_match(input) {
        return Ok(Target::Feed(channel_feed(input)));
    }
    if input.starts_with('@') && input.len() > 1 && !input.contains('/') {
        return Ok(Target::ChannelPage(format!("https://www.youtube.com/{input}")));
    }

    let url = parse_user_url(input)?;
    if !HOSTS.contains(&bare_host(&url).as_str()) {
        return Err(invalid());
    }

    let query = |key: &str| {
        url.query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
            .filter(|v| !v.is_empty())
    };

    let segments = path_segments(&url);
    match segments.as_slice() {
        ["feeds", "videos.xml"] => {
            if let Some(channel) = query("channel_id") {
                Ok(Target::Feed(channel_feed(&channel)))
            } else if let Some(playlist) = query("playlist_id") {
                Ok(Target::Feed(playlist_feed(&playlist)))
            } else {
                Err(invalid())
            }
        }
        ["playlist"] => query("list")
            .map(|playlist| Target::Feed(playlist_feed(&playlist)))
            .ok_or_else(invalid),
        ["channel", channel, ..] if CHANNEL_ID.is_match(channel) => Ok(Target::Feed(channel_feed(channel))),
        [handle, ..] if handle.starts_with('@') => {
            Ok(Target::ChannelPage(format!("https://www.youtube.com/{handle}")))
        }
        [kind @ ("c" | "user"), name, ..] => {
            Ok(Target::ChannelPage(format!("https://www.youtube.com/{kind}/{name}")))
        }
        _ => Err(invalid()),
    }
}

fn channel_feed(channel_id: &str) -> String {
    format!("{FEED_BASE}?channel_id={channel_id}")
}

fn playlist_feed(playlist_id: &str) -> String {
    format!("{FEED_BASE}?playlist_id={playlist_id}")
}

async fn resolve_channel_page(ctx: &AppContext, page: &str) -> Result<String> {
    let response = fetch_ok(&*ctx.fetcher, Request::get(page, ctx.config.fetch.timeout())).await?;
    let channel_id = channel_id_from_page(&response.text())
        .ok_or_else(|| TributaryError::InvalidFeed(format!("no channel id found on {page}")))?;
    tracing::debug!("Resolved YouTube page {} to channel {}", page, channel_id);
    Ok(channel_feed(&channel_id))
}

/// Channel id from the page's feed link, else from its embedded data.
pub fn channel_id_from_page(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let from_link = Selector::parse(r#"link[type="application/rss+xml"][href]"#)
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .filter_map(|element| element.value().attr("href"))
                .filter_map(|href| Url::parse(href).ok())
                .find_map(|url| {
                    url.query_pairs()
                        .find(|(k, _)| k == "channel_id")
                        .map(|(_, v)| v.into_owned())
                })
        });

    from_link.or_else(|| {
        PAGE_CHANNEL_ID
            .captures(html)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    })
}

/// Channel id of the feed url, else of the feed's author uri.
fn feed_channel_id(url: &str, parsed: &Feed) -> Option<String> {
    let from_url = Url::parse(url).ok().and_then(|u| {
        u.query_pairs()
            .find(|(k, _)| k == "channel_id")
            .map(|(_, v)| v.into_owned())
    });

    from_url.or_else(|| {
        parsed
            .authors
            .iter()
            .filter_map(|author| author.uri.as_deref())
            .find_map(|uri| uri.rsplit('/').next().filter(|id| CHANNEL_ID.is_match(id)))
            .map(String::from)
    })
}

async fn channel_icon(ctx: &AppContext, url: &str, parsed: &Feed) -> Option<String> {
    let api_key = ctx.config.youtube.api_key.as_deref()?;

    let cache_key = format!("youtube-icon:{url}");
    if let Some(icon) = ctx.cache.get(&cache_key).await {
        return Some(icon);
    }
    tracing::debug!("YouTube icon cache miss for {}", url);

    let channel_id = feed_channel_id(url, parsed)?;
    match fetch_channel_icon(ctx, api_key, &channel_id).await {
        Ok(Some(icon)) => {
            ctx.cache.set_best_effort(&cache_key, &icon).await;
            Some(icon)
        }
        Ok(None) => None,
        Err(e) => {
            tracing::warn!("Failed to get icon of YouTube channel {}: {}", channel_id, e);
            None
        }
    }
}

async fn fetch_channel_icon(ctx: &AppContext, api_key: &str, channel_id: &str) -> Result<Option<String>> {
    let url = Url::parse_with_params(
        CHANNELS_API,
        &[("part", "snippet"), ("id", channel_id), ("key", api_key)],
    )?;
    let response: ChannelsResponse = fetch_json(
        &*ctx.fetcher,
        Request::get(url.as_str(), ctx.config.fetch.timeout()),
    )
    .await?;

    Ok(response.items.into_iter().next().and_then(|channel| {
        let thumbnails = channel.snippet.thumbnails;
        thumbnails
            .high
            .or(thumbnails.medium)
            .or(thumbnails.default)
            .map(|t| t.url)
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::{Profile, SourceOptions, SourceType};
    use crate::fetcher::testing::StaticFetcher;
    use crate::normalizer::test_support::context;
    use crate::normalizer::Normalizer;
    use crate::services::MemoryCache;

    const CHANNEL: &str = "UCaYhcUwRBNscFNUKTjgPFiA";

    fn feed_xml() -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns:yt="http://www.youtube.com/xml/schemas/2015" xmlns:media="http://search.yahoo.com/mrss/" xmlns="http://www.w3.org/2005/Atom">
  <link rel="self" href="http://www.youtube.com/feeds/videos.xml?channel_id={CHANNEL}"/>
  <id>yt:channel:{CHANNEL}</id>
  <title>Rust</title>
  <link rel="alternate" href="https://www.youtube.com/channel/{CHANNEL}"/>
  <author><name>Rust</name><uri>https://www.youtube.com/channel/{CHANNEL}</uri></author>
  <entry>
    <id>yt:video:abc</id>
    <title>RustConf keynote</title>
    <link rel="alternate" href="https://www.youtube.com/watch?v=abc"/>
    <author><name>Rust</name></author>
    <published>2023-11-14T22:13:20+00:00</published>
    <updated>2023-11-15T00:00:00+00:00</updated>
    <media:group>
      <media:title>RustConf keynote</media:title>
      <media:content url="https://www.youtube.com/v/abc?version=3" type="application/x-shockwave-flash" width="640" height="390"/>
      <media:thumbnail url="https://i2.ytimg.com/vi/abc/hqdefault.jpg" width="480" height="360"/>
      <media:description>The opening keynote.</media:description>
    </media:group>
  </entry>
</feed>"#
        )
    }

    fn youtube_source(input: &str) -> Source {
        Source::new(
            SourceType::Youtube,
            "u",
            "c",
            SourceOptions {
                youtube: Some(input.into()),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_classify() {
        let feed = format!("https://www.youtube.com/feeds/videos.xml?channel_id={CHANNEL}");
        assert_eq!(classify(CHANNEL).unwrap(), Target::Feed(feed.clone()));
        assert_eq!(
            classify(&format!("https://www.youtube.com/channel/{CHANNEL}/videos")).unwrap(),
            Target::Feed(feed.clone())
        );
        assert_eq!(classify(&feed).unwrap(), Target::Feed(feed.clone()));
        assert_eq!(
            classify("https://www.youtube.com/playlist?list=PLabc").unwrap(),
            Target::Feed("https://www.youtube.com/feeds/videos.xml?playlist_id=PLabc".into())
        );
        assert_eq!(
            classify("@RustVideos").unwrap(),
            Target::ChannelPage("https://www.youtube.com/@RustVideos".into())
        );
        assert_eq!(
            classify("https://youtube.com/c/rustlang").unwrap(),
            Target::ChannelPage("https://www.youtube.com/c/rustlang".into())
        );
    }

    #[test]
    fn test_classify_rejects_other_urls() {
        for input in ["https://vimeo.com/123", "https://www.youtube.com/watch?v=abc", "UCshort"] {
            assert!(
                matches!(classify(input), Err(TributaryError::FeedValidation(_))),
                "{input}"
            );
        }
    }

    #[test]
    fn test_channel_id_from_page() {
        let with_link = format!(
            r#"<html><head><link rel="alternate" type="application/rss+xml" title="RSS" href="https://www.youtube.com/feeds/videos.xml?channel_id={CHANNEL}"></head></html>"#
        );
        assert_eq!(channel_id_from_page(&with_link), Some(CHANNEL.into()));

        let with_data = format!(r#"<script>var ytInitialData = {{"externalId":"{CHANNEL}"}};</script>"#);
        assert_eq!(channel_id_from_page(&with_data), Some(CHANNEL.into()));

        assert_eq!(channel_id_from_page("<html></html>"), None);
    }

    #[tokio::test]
    async fn test_handle_is_resolved_and_items_built() {
        let page = format!(r#"<script>{{"channelId":"{CHANNEL}"}}</script>"#);
        let feed_url = format!("https://www.youtube.com/feeds/videos.xml?channel_id={CHANNEL}");
        let (ctx, _) = context(
            StaticFetcher::new()
                .route("https://www.youtube.com/@RustVideos", "text/html", page)
                .route(&feed_url, "application/atom+xml", feed_xml()),
        );

        let out = Normalizer::new()
            .normalize(&ctx, &Profile::default(), &youtube_source("@RustVideos"), None)
            .await
            .unwrap();

        assert_eq!(out.source.title, "Rust");
        assert_eq!(out.source.icon, None);
        assert_eq!(out.items.len(), 1);
        let video = &out.items[0];
        assert_eq!(video.media.as_deref(), Some("https://i2.ytimg.com/vi/abc/hqdefault.jpg"));
        assert_eq!(video.description.as_deref(), Some("The opening keynote."));
        assert_eq!(video.published_at, 1_700_000_000);
    }

    #[tokio::test]
    async fn test_icon_from_api_is_cached() {
        let feed_url = format!("https://www.youtube.com/feeds/videos.xml?channel_id={CHANNEL}");
        let api_url = format!(
            "https://www.googleapis.com/youtube/v3/channels?part=snippet&id={CHANNEL}&key=secret"
        );
        let api_body = r#"{"items":[{"snippet":{"thumbnails":{"default":{"url":"https://yt3.ggpht.com/small"},"high":{"url":"https://yt3.ggpht.com/large"}}}}]}"#;
        let fetcher = Arc::new(
            StaticFetcher::new()
                .route(&feed_url, "application/atom+xml", feed_xml())
                .route(&api_url, "application/json", api_body),
        );
        let mut config = crate::config::Config::default();
        config.youtube.api_key = Some("secret".into());
        let ctx = AppContext::with_fetcher(config, fetcher.clone()).cache(Arc::new(MemoryCache::default()));
        let normalizer = Normalizer::new();

        for _ in 0..2 {
            let out = normalizer
                .normalize(&ctx, &Profile::default(), &youtube_source(CHANNEL), None)
                .await
                .unwrap();
            assert_eq!(out.source.icon.as_deref(), Some("https://yt3.ggpht.com/large"));
        }

        let api_calls = fetcher.requested().iter().filter(|u| **u == api_url).count();
        assert_eq!(api_calls, 1);
    }
}
