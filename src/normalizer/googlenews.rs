use url::Url;

use crate::app::{AppContext, Result, TributaryError};
use crate::domain::{GoogleNewsQuery, Normalized, Source, SourceMeta};
use crate::feed;
use crate::normalizer::{collect_items, favicon_url, finish_source, parse_user_url, EntryPolicy};

const HOST: &str = "news.google.com";

pub async fn normalize(
    ctx: &AppContext,
    source: &Source,
    query: &GoogleNewsQuery,
    raw: Option<&[u8]>,
) -> Result<Normalized> {
    let url = canonical_url(query)?;
    let parsed = feed::parse_raw_or_fetch(ctx, &url, raw).await?;

    let title = feed::feed_title(&parsed)
        .map(|title| format!("Google News | {title}"))
        .ok_or_else(|| TributaryError::InvalidFeed(format!("{url} has no title")))?;
    let icon = favicon_url(ctx, "https://news.google.com").await;

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

    let items = collect_items(&source, &parsed, &EntryPolicy::default(), |_, item| Some(item));

    Ok(Normalized { source, items })
}

/// RSS url for a Google News page url or a search.
///
/// Page urls get an `/rss` prefix on their path; searches use the
/// `en-US`/`US`/`US:en` locale unless one is given.
pub fn canonical_url(query: &GoogleNewsQuery) -> Result<String> {
    match query {
        GoogleNewsQuery::Url(input) => {
            let mut url = parse_user_url(input)?;
            if url.host_str() != Some(HOST) {
                return Err(TributaryError::validation(format!(
                    "{input} is not a Google News url"
                )));
            }
            if !(url.path() == "/rss" || url.path().starts_with("/rss/")) {
                let path = format!("/rss{}", url.path());
                url.set_path(&path);
            }
            url.set_scheme("https")
                .map_err(|_| TributaryError::validation(format!("invalid url {input}")))?;
            Ok(url.to_string())
        }
        GoogleNewsQuery::Search { search, ceid, gl, hl } => {
            let url = Url::parse_with_params(
                "https://news.google.com/rss/search",
                &[
                    ("q", search.as_str()),
                    ("hl", hl.as_deref().unwrap_or("en-US")),
                    ("gl", gl.as_deref().unwrap_or("US")),
                    ("ceid", ceid.as_deref().unwrap_or("US:en")),
                ],
            )?;
            Ok(url.to_string())
        }
    }
}
