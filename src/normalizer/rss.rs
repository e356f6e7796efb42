//! Generic RSS / Atom / JSON Feed sources.
//!
//! When the configured url is not a feed, the page is searched for an
//! alternate feed link and that url is used (and stored) instead.

use scraper::{Html, Selector};
use url::Url;

use crate::app::{AppContext, Result, TributaryError};
use crate::domain::{Normalized, Source, SourceMeta, SourceOptions};
use crate::feed;
use crate::fetcher::{fetch_ok, Request};
use crate::media;
use crate::normalizer::{collect_items, favicon_url, finish_source, parse_user_url, EntryPolicy};

const FEED_LINK_SELECTOR: &str = r#"link[type="application/rss+xml"][href], link[type="application/atom+xml"][href], link[type="application/rdf+xml"][href], link[type="application/feed+json"][href]"#;

pub async fn normalize(
    ctx: &AppContext,
    source: &Source,
    input: &str,
    raw: Option<&[u8]>,
) -> Result<Normalized> {
    let mut url = canonical_url(input)?;

    let parsed = match raw {
        Some(body) => feed::parse(body)?,
        None => match feed::get_and_parse(ctx, &url).await {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!("{} is not a feed ({}), looking for a feed link", url, e);
                url = discover(ctx, &url).await?.ok_or(e)?;
                feed::get_and_parse(ctx, &url).await?
            }
        },
    };

    let title = feed::feed_title(&parsed)
        .ok_or_else(|| TributaryError::InvalidFeed(format!("{url} has no title")))?;
    let link = feed::feed_link(&parsed);

    let icon = match favicon_url(ctx, link.as_deref().unwrap_or(&url)).await {
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
            options: Some(SourceOptions::rss(&url)),
        },
    )
    .await;

    let items = collect_items(&source, &parsed, &EntryPolicy::default(), |entry, mut item| {
        item.media = media::entry_media(entry);
        Some(item)
    });

    Ok(Normalized { source, items })
}

/// The url as given, with `https://` added when no scheme is present.
pub fn canonical_url(input: &str) -> Result<String> {
    let trimmed = input.trim();
    parse_user_url(trimmed)?;
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("https://{trimmed}"))
    }
}

async fn discover(ctx: &AppContext, url: &str) -> Result<Option<String>> {
    let page = fetch_ok(&*ctx.fetcher, Request::get(url, ctx.config.fetch.timeout())).await?;
    let base = Url::parse(&page.url).or_else(|_| Url::parse(url))?;
    Ok(discover_feed_link(&page.text(), &base))
}

/// First alternate feed link of an html page, resolved against `base`.
pub fn discover_feed_link(html: &str, base: &Url) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(FEED_LINK_SELECTOR).ok()?;
    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .find_map(|href| base.join(href.trim()).ok())
        .map(|url| url.to_string())
}
