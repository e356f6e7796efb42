use crate::app::{AppContext, Result, TributaryError};
use crate::config::StaticLists;
use crate::domain::{Normalized, Source, SourceMeta};
use crate::feed;
use crate::media;
use crate::normalizer::{bare_host, collect_items, favicon_url, finish_source, parse_user_url, path_segments, EntryPolicy};

const BOARD_HOSTS: [&str; 2] = ["boards.4chan.org", "boards.4channel.org"];

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
    let icon = favicon_url(ctx, "https://boards.4chan.org").await;

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

    let items = collect_items(&source, &parsed, &EntryPolicy::untitled(), |entry, mut item| {
        item.media = media::entry_html(entry).and_then(|html| media::first_image(&html));
        Some(item)
    });

    Ok(Normalized { source, items })
}

/// Board index feed for `g`, `/g/` or a board url.
pub fn canonical_url(input: &str) -> Result<String> {
    let input = input.trim();

    let board = if input.contains('.') {
        let url = parse_user_url(input)?;
        if !BOARD_HOSTS.contains(&bare_host(&url).as_str()) {
            return Err(TributaryError::validation(format!("{input} is not a 4chan url")));
        }
        path_segments(&url).first().map(|s| s.to_string()).unwrap_or_default()
    } else {
        input.trim_matches('/').to_string()
    };

    let board = board.to_ascii_lowercase();
    if !StaticLists::get().is_fourchan_board(&board) {
        return Err(TributaryError::validation(format!("unknown 4chan board: {input}")));
    }
    Ok(format!("https://boards.4chan.org/{board}/index.rss"))
}
