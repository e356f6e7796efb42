//! Per-platform adapters and the dispatcher selecting between them.
//!
//! Every adapter takes a user's [`Source`] with its options, resolves the
//! options to one canonical URL, fetches and parses the upstream data and
//! returns a new source plus its items.

pub mod fourchan;
pub mod github;
pub mod googlenews;
pub mod lemmy;
pub mod mastodon;
pub mod parallel;
pub mod pinterest;
pub mod podcast;
pub mod reddit;
pub mod rss;
pub mod stackoverflow;
pub mod tumblr;
pub mod x;
pub mod youtube;

use feed_rs::model::{Entry, Feed};
use url::Url;

use crate::app::{AppContext, Result, TributaryError};
use crate::domain::{Item, Normalized, PlatformOptions, Profile, Source, SourceMeta};
use crate::favicon;
use crate::feed;
use crate::media;
use crate::services::upload_icon;
use crate::skip::{should_skip, Candidate};

#[derive(Clone, Default)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Poll `source` and return its normalized form and current items.
    ///
    /// `raw` holds already fetched feed data; adapters that read a single
    /// document use it instead of fetching.
    pub async fn normalize(
        &self,
        ctx: &AppContext,
        profile: &Profile,
        source: &Source,
        raw: Option<&[u8]>,
    ) -> Result<Normalized> {
        let options = source.options.resolve(source.source_type)?;

        let normalized = match &options {
            PlatformOptions::Rss(input) => rss::normalize(ctx, source, input, raw).await,
            PlatformOptions::Github(mode) => github::normalize(ctx, profile, source, mode).await,
            PlatformOptions::GoogleNews(query) => googlenews::normalize(ctx, source, query, raw).await,
            PlatformOptions::Mastodon(input) => mastodon::normalize(ctx, source, input, raw).await,
            PlatformOptions::Lemmy(input) => lemmy::normalize(ctx, source, input, raw).await,
            PlatformOptions::Pinterest(input) => pinterest::normalize(ctx, source, input, raw).await,
            PlatformOptions::Podcast(input) => podcast::normalize(ctx, source, input, raw).await,
            PlatformOptions::Reddit(input) => reddit::normalize(ctx, source, input, raw).await,
            PlatformOptions::StackOverflow(query) => {
                stackoverflow::normalize(ctx, source, query, raw).await
            }
            PlatformOptions::Tumblr(input) => tumblr::normalize(ctx, source, input, raw).await,
            PlatformOptions::FourChan(input) => fourchan::normalize(ctx, source, input, raw).await,
            PlatformOptions::X(input) => x::normalize(ctx, source, input, raw).await,
            PlatformOptions::Youtube(input) => youtube::normalize(ctx, source, input, raw).await,
        }?;

        tracing::info!(
            "Normalized {} source {} with {} items",
            source.source_type,
            normalized.source.id,
            normalized.items.len()
        );

        Ok(normalized)
    }
}

/// How a feed-based adapter reads its entries.
pub(crate) struct EntryPolicy {
    pub title_required: bool,
    pub link: fn(&Entry) -> Option<String>,
}

impl Default for EntryPolicy {
    fn default() -> Self {
        Self {
            title_required: true,
            link: |entry| feed::entry_link(entry).map(String::from),
        }
    }
}

impl EntryPolicy {
    pub fn untitled() -> Self {
        Self {
            title_required: false,
            ..Default::default()
        }
    }
}

/// Turn feed entries into items, applying the skip rules. `build` adds the
/// platform specific fields and may drop the item by returning `None`.
pub(crate) fn collect_items<F>(source: &Source, feed: &Feed, policy: &EntryPolicy, mut build: F) -> Vec<Item>
where
    F: FnMut(&Entry, Item) -> Option<Item>,
{
    let updated_at = source.last_updated();
    let mut items = Vec::new();

    for (index, entry) in feed.entries.iter().enumerate() {
        let title = feed::entry_title(entry);
        let link = (policy.link)(entry);
        let timestamp = feed::entry_timestamp(entry);

        let mut candidate = Candidate::new(title.as_deref(), link.as_deref(), timestamp);
        candidate.title_required = policy.title_required;
        if should_skip(index, &candidate, updated_at) {
            continue;
        }

        let (Some(identifier), Some(timestamp)) = (feed::entry_identifier(entry), timestamp) else {
            tracing::debug!("Dropping entry {} of {} without identifier", index, source.id);
            continue;
        };

        let mut item = Item::new(source, &identifier, timestamp.timestamp());
        item.title = title;
        item.link = link;
        item.description = media::entry_description(entry);
        item.author = feed::entry_author(entry);

        if let Some(item) = build(entry, item) {
            items.push(item);
        }
    }

    items
}

/// Build the output source and push its icon through the uploader.
pub(crate) async fn finish_source(ctx: &AppContext, source: &Source, meta: SourceMeta) -> Source {
    let draft = source.normalized(meta);
    let icon = upload_icon(&*ctx.icons, &draft, draft.icon.clone()).await;
    Source { icon, ..draft }
}

/// Url of the best favicon of `page`, if any.
pub(crate) async fn favicon_url(ctx: &AppContext, page: &str) -> Option<String> {
    favicon::resolve(&*ctx.fetcher, &ctx.config.fetch, page, None)
        .await
        .map(|f| f.url)
}

/// Parse user input as an absolute http(s) url, adding `https://` when the
/// scheme is missing.
pub(crate) fn parse_user_url(input: &str) -> Result<Url> {
    let trimmed = input.trim();
    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let url = Url::parse(&with_scheme)
        .map_err(|e| TributaryError::validation(format!("invalid url {trimmed}: {e}")))?;
    if url.host_str().is_none() {
        return Err(TributaryError::validation(format!("invalid url {trimmed}: missing host")));
    }
    Ok(url)
}

/// Non-empty path segments of `url`.
pub(crate) fn path_segments(url: &Url) -> Vec<&str> {
    url.path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

/// Lower-cased host without a leading `www.`.
pub(crate) fn bare_host(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    host.strip_prefix("www.").map(String::from).unwrap_or(host)
}
