use crate::app::{AppContext, Result, TributaryError};
use crate::config::StaticLists;
use crate::domain::{Normalized, Source, SourceMeta};
use crate::feed;
use crate::media;
use crate::normalizer::{collect_items, favicon_url, finish_source, parse_user_url, path_segments, EntryPolicy};

const BASE: &str = "https://www.pinterest.com";

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
    let icon = favicon_url(ctx, BASE).await;

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
        item.media = media::entry_html(entry).and_then(|html| media::first_image(&html));
        Some(item)
    });

    Ok(Normalized { source, items })
}

/// `@user` and `@user/board` shorthands or profile / board urls on any
/// Pinterest domain.
pub fn canonical_url(input: &str) -> Result<String> {
    let input = input.trim();

    let path = match input.strip_prefix('@') {
        Some(path) => path.to_string(),
        None => {
            let url = parse_user_url(input)?;
            let host = url.host_str().unwrap_or_default();
            if !StaticLists::get().is_pinterest_domain(host) {
                return Err(TributaryError::validation(format!(
                    "{input} is not a Pinterest url"
                )));
            }
            path_segments(&url).join("/")
        }
    };

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [user] | [user, "feed.rss"] => Ok(format!("{BASE}/{user}/feed.rss")),
        [user, board] => {
            let board = board.trim_end_matches(".rss");
            Ok(format!("{BASE}/{user}/{board}.rss"))
        }
        _ => Err(TributaryError::validation(format!(
            "{input} is not a Pinterest user or board"
        ))),
    }
}
