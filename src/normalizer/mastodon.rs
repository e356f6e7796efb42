//! Mastodon account and hashtag feeds.

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
    let link = feed::feed_link(&parsed);

    let icon = match feed::feed_icon(&parsed) {
        Some(avatar) => Some(avatar),
        None => favicon_url(ctx, link.as_deref().unwrap_or(&url)).await,
    };

    let source = finish_source(
        ctx,
        source,
        SourceMeta {
            id: source.id_for(&url),
            title,
            link,
            icon,
            options: None,
        },
    )
    .await;

    let account = source.title.clone();
    let items = collect_items(&source, &parsed, &EntryPolicy::untitled(), |entry, mut item| {
        item.media = media::entry_media(entry);
        if item.author.is_none() {
            item.author = Some(account.clone());
        }
        Some(item)
    });

    Ok(Normalized { source, items })
}

/// RSS url for an account (`@user@instance`), a hashtag (`#tag`,
/// `#tag@instance`) or a profile / tag page url.
pub fn canonical_url(input: &str) -> Result<String> {
    let input = input.trim();

    if let Some(tag) = input.strip_prefix('#') {
        let (tag, instance) = match tag.split_once('@') {
            Some((tag, instance)) => (tag, instance.to_string()),
            None => (tag, default_instance()),
        };
        if tag.is_empty() || instance.is_empty() {
            return Err(invalid(input));
        }
        return Ok(format!("https://{instance}/tags/{tag}.rss"));
    }

    if let Some(account) = input.strip_prefix('@') {
        return match account.split_once('@') {
            Some((user, instance)) if !user.is_empty() && !instance.is_empty() => {
                Ok(format!("https://{instance}/@{user}.rss"))
            }
            _ => Err(invalid(input)),
        };
    }

    let url = parse_user_url(input)?;
    let host = url.host_str().ok_or_else(|| invalid(input))?.to_ascii_lowercase();
    let segments = path_segments(&url);
    match segments.as_slice() {
        [user] if user.starts_with('@') && user.len() > 1 => {
            let user = user.trim_end_matches(".rss");
            Ok(format!("https://{host}/{user}.rss"))
        }
        ["tags", tag] => {
            let tag = tag.trim_end_matches(".rss");
            Ok(format!("https://{host}/tags/{tag}.rss"))
        }
        _ => Err(invalid(input)),
    }
}

fn default_instance() -> String {
    StaticLists::get()
        .mastodon_instances
        .first()
        .cloned()
        .unwrap_or_else(|| "mastodon.social".to_string())
}

fn invalid(input: &str) -> TributaryError {
    TributaryError::validation(format!("{input} is not a Mastodon account or hashtag"))
}
