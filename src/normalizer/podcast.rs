//! Podcast feeds, given directly or as an Apple Podcasts page.

use feed_rs::model::Entry;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use url::Url;

use crate::app::{AppContext, Result, TributaryError};
use crate::domain::{Normalized, Source, SourceMeta, SourceOptions};
use crate::feed;
use crate::fetcher::{fetch_json, Request};
use crate::media;
use crate::normalizer::{collect_items, favicon_url, finish_source, parse_user_url, rss, EntryPolicy};

static APPLE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/id(\d+)").expect("Failed to compile podcast id regex"));

const LOOKUP_URL: &str = "https://itunes.apple.com/lookup";

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    results: Vec<LookupResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupResult {
    feed_url: Option<String>,
}

pub async fn normalize(
    ctx: &AppContext,
    source: &Source,
    input: &str,
    raw: Option<&[u8]>,
) -> Result<Normalized> {
    let url = match apple_podcast_id(input)? {
        Some(id) => lookup_feed_url(ctx, &id).await?,
        None => rss::canonical_url(input)?,
    };
    let parsed = feed::parse_raw_or_fetch(ctx, &url, raw).await?;

    let title = feed::feed_title(&parsed)
        .ok_or_else(|| TributaryError::InvalidFeed(format!("{url} has no title")))?;
    let link = feed::feed_link(&parsed);

    let icon = match feed::feed_icon(&parsed) {
        Some(artwork) => Some(artwork),
        None => match &link {
            Some(link) => favicon_url(ctx, link).await,
            None => None,
        },
    };

    let source = finish_source(
        ctx,
        source,
        SourceMeta {
            id: source.id_for(&url),
            title,
            link,
            icon,
            options: Some(SourceOptions {
                podcast: Some(url.clone()),
                ..Default::default()
            }),
        },
    )
    .await;

    let policy = EntryPolicy {
        link: episode_link,
        ..Default::default()
    };
    let items = collect_items(&source, &parsed, &policy, |entry, mut item| {
        item.media = media::entry_audio(entry);
        item.set_option_urls("images", media::entry_thumbnails(entry));
        Some(item)
    });

    Ok(Normalized { source, items })
}

/// Episodes often have no page of their own, the audio file stands in.
fn episode_link(entry: &Entry) -> Option<String> {
    feed::entry_link(entry)
        .map(String::from)
        .filter(|link| !link.is_empty())
        .or_else(|| media::entry_audio(entry))
}

/// The numeric id of a `podcasts.apple.com` url.
fn apple_podcast_id(input: &str) -> Result<Option<String>> {
    let trimmed = input.trim();
    let looks_like_apple = trimmed.contains("podcasts.apple.com") || trimmed.contains("itunes.apple.com");
    if !looks_like_apple {
        return Ok(None);
    }

    let url = parse_user_url(trimmed)?;
    APPLE_ID
        .captures(url.path())
        .and_then(|caps| caps.get(1))
        .map(|id| Some(id.as_str().to_string()))
        .ok_or_else(|| TributaryError::validation(format!("{trimmed} has no podcast id")))
}

async fn lookup_feed_url(ctx: &AppContext, id: &str) -> Result<String> {
    let url = Url::parse_with_params(LOOKUP_URL, &[("id", id), ("entity", "podcast")])?;
    let response: LookupResponse = fetch_json(
        &*ctx.fetcher,
        Request::get(url.as_str(), ctx.config.fetch.timeout()),
    )
    .await?;

    let feed_url = response
        .results
        .into_iter()
        .find_map(|result| result.feed_url)
        .ok_or_else(|| TributaryError::InvalidFeed(format!("no feed url for podcast {id}")))?;
    tracing::debug!("Resolved Apple podcast {} to {}", id, feed_url);
    Ok(feed_url)
}
