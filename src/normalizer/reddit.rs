use crate::app::{AppContext, Result, TributaryError};
use crate::domain::{Normalized, Source, SourceMeta};
use crate::feed;
use crate::media;
use crate::normalizer::{bare_host, collect_items, favicon_url, finish_source, parse_user_url, EntryPolicy};

const BASE: &str = "https://www.reddit.com";
const HOSTS: [&str; 3] = ["reddit.com", "old.reddit.com", "new.reddit.com"];

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

    let icon = match feed::feed_icon(&parsed) {
        Some(icon) => Some(icon),
        None => favicon_url(ctx, BASE).await,
    };

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
        item.media = media::entry_thumbnails(entry)
            .into_iter()
            .next()
            .or_else(|| media::entry_html(entry).and_then(|html| media::first_image(&html)));
        Some(item)
    });

    Ok(Normalized { source, items })
}

/// `r/name`, `u/name` (with or without a leading slash) or any reddit url,
/// as `https://www.reddit.com/<path>.rss`.
pub fn canonical_url(input: &str) -> Result<String> {
    let input = input.trim();

    let shorthand = input.trim_start_matches('/');
    if let Some(name) = shorthand.strip_prefix("r/") {
        return listing("r", name, input);
    }
    if let Some(name) = shorthand.strip_prefix("u/").or_else(|| shorthand.strip_prefix("user/")) {
        return listing("user", name, input);
    }

    let url = parse_user_url(input)?;
    if !HOSTS.contains(&bare_host(&url).as_str()) {
        return Err(TributaryError::validation(format!("{input} is not a reddit url")));
    }

    let path = url.path().trim_end_matches('/');
    if path.is_empty() {
        return Err(TributaryError::validation(format!("{input} has no subreddit or user")));
    }
    let path = if path.ends_with(".rss") {
        path.to_string()
    } else {
        format!("{path}.rss")
    };

    Ok(match url.query() {
        Some(query) => format!("{BASE}{path}?{query}"),
        None => format!("{BASE}{path}"),
    })
}

fn listing(kind: &str, name: &str, input: &str) -> Result<String> {
    let name = name.trim_end_matches('/').trim_end_matches(".rss");
    if name.is_empty() || name.contains('/') {
        return Err(TributaryError::validation(format!("{input} is not a subreddit or user")));
    }
    Ok(format!("{BASE}/{kind}/{name}.rss"))
}
