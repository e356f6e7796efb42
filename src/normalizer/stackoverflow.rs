use url::Url;

use crate::app::{AppContext, Result, TributaryError};
use crate::domain::{Normalized, Source, SourceMeta, StackOverflowQuery};
use crate::feed;
use crate::normalizer::{bare_host, collect_items, favicon_url, finish_source, parse_user_url, EntryPolicy};

const SORTS: [&str; 6] = ["newest", "featured", "frequent", "votes", "active", "unanswered"];

pub async fn normalize(
    ctx: &AppContext,
    source: &Source,
    query: &StackOverflowQuery,
    raw: Option<&[u8]>,
) -> Result<Normalized> {
    let url = canonical_url(query)?;
    let parsed = feed::parse_raw_or_fetch(ctx, &url, raw).await?;

    let title = feed::feed_title(&parsed)
        .ok_or_else(|| TributaryError::InvalidFeed(format!("{url} has no title")))?;
    let icon = favicon_url(ctx, "https://stackoverflow.com").await;

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

pub fn canonical_url(query: &StackOverflowQuery) -> Result<String> {
    match query {
        StackOverflowQuery::Tag { tag, sort } => {
            if !SORTS.contains(&sort.as_str()) {
                return Err(TributaryError::validation(format!(
                    "unsupported stackoverflow sort: {sort}"
                )));
            }
            let url = Url::parse_with_params(
                "https://stackoverflow.com/feeds/tag",
                &[("tagnames", tag.as_str()), ("sort", sort.as_str())],
            )?;
            Ok(url.to_string())
        }
        StackOverflowQuery::Url(input) => {
            let url = parse_user_url(input)?;
            if bare_host(&url) != "stackoverflow.com" || !url.path().starts_with("/feeds") {
                return Err(TributaryError::validation(format!(
                    "{input} is not a Stack Overflow feed url"
                )));
            }
            Ok(url.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Profile, SourceOptions, SourceType, StackOverflowOptions};
    use crate::fetcher::testing::StaticFetcher;
    use crate::normalizer::test_support::context;
    use crate::normalizer::Normalizer;

    fn tag(tag: &str, sort: &str) -> StackOverflowQuery {
        StackOverflowQuery::Tag {
            tag: tag.into(),
            sort: sort.into(),
        }
    }

    #[test]
    fn test_tag_url() {
        assert_eq!(
            canonical_url(&tag("rust", "newest")).unwrap(),
            "https://stackoverflow.com/feeds/tag?tagnames=rust&sort=newest"
        );
        assert_eq!(
            canonical_url(&tag("c#", "votes")).unwrap(),
            "https://stackoverflow.com/feeds/tag?tagnames=c%23&sort=votes"
        );
    }

    #[test]
    fn test_invalid_queries() {
        assert!(matches!(
            canonical_url(&tag("rust", "random")),
            Err(TributaryError::FeedValidation(_))
        ));
        assert!(matches!(
            canonical_url(&StackOverflowQuery::Url("https://example.com/feeds".into())),
            Err(TributaryError::FeedValidation(_))
        ));
        assert!(matches!(
            canonical_url(&StackOverflowQuery::Url("https://stackoverflow.com/questions".into())),
            Err(TributaryError::FeedValidation(_))
        ));
    }

    #[test]
    fn test_feed_url_is_kept() {
        let url = "https://stackoverflow.com/feeds/question/123";
        assert_eq!(
            canonical_url(&StackOverflowQuery::Url(url.into())).unwrap(),
            url
        );
    }

    #[tokio::test]
    async fn test_normalize_tag() {
        let url = "https://stackoverflow.com/feeds/tag?tagnames=rust&sort=newest";
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title type="text">Newest questions tagged rust - Stack Overflow</title>
  <link rel="alternate" href="https://stackoverflow.com/questions/tagged/?tagnames=rust&amp;sort=newest" type="text/html" />
  <entry>
    <id>https://stackoverflow.com/q/1</id>
    <title type="text">How do lifetimes work?</title>
    <author><name>ferris</name></author>
    <link rel="alternate" href="https://stackoverflow.com/questions/1/how-do-lifetimes-work" />
    <published>2023-11-14T22:13:20Z</published>
    <updated>2023-11-14T22:13:20Z</updated>
    <summary type="html">&lt;p&gt;I am confused.&lt;/p&gt;</summary>
  </entry>
</feed>"#;
        let (ctx, _) = context(StaticFetcher::new().route(url, "application/atom+xml", xml));
        let source = Source::new(
            SourceType::StackOverflow,
            "u",
            "c",
            SourceOptions {
                stackoverflow: Some(StackOverflowOptions {
                    kind: "tag".into(),
                    tag: Some("rust".into()),
                    ..Default::default()
                }),
                ..Default::default()
            },
        );

        let out = Normalizer::new()
            .normalize(&ctx, &Profile::default(), &source, None)
            .await
            .unwrap();

        assert_eq!(out.source.title, "Newest questions tagged rust - Stack Overflow");
        assert_eq!(out.items.len(), 1);
        assert_eq!(out.items[0].author.as_deref(), Some("ferris"));
        assert_eq!(out.items[0].description.as_deref(), Some("I am confused."));
    }
}
