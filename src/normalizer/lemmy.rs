//! Lemmy communities, users and instance front pages.

use url::Url;

use crate::app::{AppContext, Result, TributaryError};
use crate::config::StaticLists;
use crate::domain::{Normalized, Source, SourceMeta};
use crate::feed;
use crate::media;
use crate::normalizer::{collect_items, favicon_url, finish_source, parse_user_url, path_segments, EntryPolicy};

pub async fn normalize(
    ctx: &AppContext,
    source: &Source,
    input: &str,
    raw: Option<&[u8]>,
) -> Result<Normalized> {
    let url = canonical_url(input)?;
    let parsed = feed::parse_raw_or_fetch(ctx, &url, raw).await?;

    let title = feed::feed_title(&parsed)
        .ok_or_else(|| TributaryError::InvalidFeed(format!("{url} has no title")))?;
    let instance = Url::parse(&url)?.origin().ascii_serialization();
    let icon = favicon_url(ctx, &instance).await;

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
        item.media = item
            .link
            .as_deref()
            .filter(|link| media::is_media_url(link))
            .map(String::from)
            .or_else(|| media::entry_media(entry));
        Some(item)
    });

    Ok(Normalized { source, items })
}

/// Feed url for `!community@instance`, `@user@instance`, a community or
/// user page, an existing `/feeds/` url or a known instance's front page.
pub fn canonical_url(input: &str) -> Result<String> {
    let input = input.trim();

    if let Some(rest) = input.strip_prefix('!') {
        return handle_url("c", rest).ok_or_else(|| invalid(input));
    }
    if let Some(rest) = input.strip_prefix('@') {
        return handle_url("u", rest).ok_or_else(|| invalid(input));
    }

    let url = parse_user_url(input)?;
    let host = url.host_str().ok_or_else(|| invalid(input))?.to_ascii_lowercase();
    let segments = path_segments(&url);

    match segments.as_slice() {
        ["feeds", ..] => Ok(format!("https://{host}{}", path_and_query(&url))),
        [kind @ ("c" | "u"), name] => Ok(feed_url(&host, kind, name)),
        [] if StaticLists::get().is_lemmy_instance(&host) => {
            Ok(format!("https://{host}/feeds/all.xml?sort=New"))
        }
        _ => Err(invalid(input)),
    }
}

fn handle_url(kind: &str, handle: &str) -> Option<String> {
    let (name, instance) = handle.split_once('@')?;
    if name.is_empty() || instance.is_empty() {
        return None;
    }
    Some(feed_url(&instance.to_ascii_lowercase(), kind, name))
}

fn feed_url(host: &str, kind: &str, name: &str) -> String {
    format!("https://{host}/feeds/{kind}/{name}.xml?sort=New")
}

fn path_and_query(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

fn invalid(input: &str) -> TributaryError {
    TributaryError::validation(format!("{input} is not a Lemmy community or user"))
}
