use crate::app::{AppContext, Result, TributaryError};
use crate::domain::{Normalized, Source, SourceMeta};
use crate::feed;
use crate::media;
use crate::normalizer::{bare_host, collect_items, favicon_url, finish_source, parse_user_url, path_segments, EntryPolicy};

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

    let blog = url.trim_end_matches("/rss");
    let icon = match favicon_url(ctx, blog).await {
        Some(icon) => Some(icon),
        None => feed::feed_icon(&parsed),
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

    let items = collect_items(&source, &parsed, &EntryPolicy::untitled(), |entry, mut item| {
        item.media = media::entry_html(entry).and_then(|html| media::first_image(&html));
        Some(item)
    });

    Ok(Normalized { source, items })
}

/// `name`, `name.tumblr.com` or `https://www.tumblr.com/name` as
/// `https://name.tumblr.com/rss`.
pub fn canonical_url(input: &str) -> Result<String> {
    let input = input.trim();
    let invalid = || TributaryError::validation(format!("{input} is not a Tumblr blog"));

    let is_name = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    if is_name(input) {
        return Ok(blog_url(input));
    }

    let url = parse_user_url(input)?;
    let host = bare_host(&url);
    let name = match host.strip_suffix(".tumblr.com") {
        Some(name) => name.to_string(),
        None if host == "tumblr.com" => path_segments(&url)
            .first()
            .map(|s| s.to_string())
            .ok_or_else(invalid)?,
        None => return Err(invalid()),
    };

    if !is_name(&name) {
        return Err(invalid());
    }
    Ok(blog_url(&name))
}

fn blog_url(name: &str) -> String {
    format!("https://{}.tumblr.com/rss", name.to_ascii_lowercase())
}
