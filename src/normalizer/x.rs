//! X (Twitter) profiles through the public syndication timeline.
//!
//! The timeline is an html page embedding its data as `__NEXT_DATA__` JSON.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use serde::Deserialize;

use crate::app::{AppContext, Result, TributaryError};
use crate::domain::{Item, Normalized, Source, SourceMeta};
use crate::fetcher::{fetch_ok, Request};
use crate::normalizer::{bare_host, finish_source, parse_user_url, path_segments};
use crate::skip::{should_skip, Candidate};

const TIMELINE_URL: &str = "https://syndication.twitter.com/srv/timeline-profile/screen-name";
const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";
const HOSTS: [&str; 4] = ["x.com", "twitter.com", "mobile.twitter.com", "mobile.x.com"];

static USERNAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]{1,15}$").expect("Failed to compile username regex"));

#[derive(Debug, Deserialize)]
struct NextData {
    props: Props,
}

#[derive(Debug, Deserialize)]
struct Props {
    #[serde(rename = "pageProps")]
    page_props: PageProps,
}

#[derive(Debug, Deserialize)]
struct PageProps {
    timeline: Timeline,
}

#[derive(Debug, Deserialize)]
struct Timeline {
    #[serde(default)]
    entries: Vec<TimelineEntry>,
}

#[derive(Debug, Deserialize)]
struct TimelineEntry {
    content: Option<TimelineContent>,
}

#[derive(Debug, Deserialize)]
struct TimelineContent {
    tweet: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Tweet {
    id_str: String,
    created_at: String,
    #[serde(default)]
    full_text: Option<String>,
    #[serde(default)]
    text: Option<String>,
    user: TweetUser,
    #[serde(default)]
    retweeted_status: Option<Box<Tweet>>,
    #[serde(default)]
    extended_entities: Option<Entities>,
    #[serde(default)]
    entities: Option<Entities>,
    #[serde(default)]
    media: Option<Vec<TweetMedia>>,
}

#[derive(Debug, Deserialize)]
struct TweetUser {
    name: String,
    screen_name: String,
    #[serde(default)]
    profile_image_url_https: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Entities {
    #[serde(default)]
    media: Vec<TweetMedia>,
}

#[derive(Debug, Deserialize)]
struct TweetMedia {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    media_url_https: Option<String>,
    #[serde(default)]
    video_info: Option<VideoInfo>,
}

#[derive(Debug, Deserialize)]
struct VideoInfo {
    #[serde(default)]
    variants: Vec<VideoVariant>,
}

#[derive(Debug, Deserialize)]
struct VideoVariant {
    #[serde(default)]
    bitrate: Option<u64>,
    #[serde(default)]
    content_type: String,
    url: String,
}

impl Tweet {
    fn text(&self) -> Option<&str> {
        self.full_text
            .as_deref()
            .or(self.text.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_str(&self.created_at, CREATED_AT_FORMAT)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Media list of the retweet first, then the tweet's own; the first
    /// non-empty one wins.
    fn media(&self) -> &[TweetMedia] {
        let retweet = self.retweeted_status.as_deref();
        let lists = [
            retweet.and_then(|rt| rt.extended_entities.as_ref()).map(|e| e.media.as_slice()),
            retweet.and_then(|rt| rt.entities.as_ref()).map(|e| e.media.as_slice()),
            retweet.and_then(|rt| rt.media.as_deref()),
            self.extended_entities.as_ref().map(|e| e.media.as_slice()),
            self.entities.as_ref().map(|e| e.media.as_slice()),
        ];
        lists
            .into_iter()
            .flatten()
            .find(|list| !list.is_empty())
            .unwrap_or(&[])
    }
}

pub async fn normalize(
    ctx: &AppContext,
    source: &Source,
    input: &str,
    raw: Option<&[u8]>,
) -> Result<Normalized> {
    let username = username(input)?;
    let profile_url = format!("https://x.com/{username}");

    let html = match raw {
        Some(body) => String::from_utf8_lossy(body).into_owned(),
        None => {
            let url = format!("{TIMELINE_URL}/{username}");
            fetch_ok(&*ctx.fetcher, Request::get(url, ctx.config.fetch.timeout()))
                .await?
                .text()
        }
    };
    let tweets = parse_timeline(&html)?;

    let owner = tweets
        .iter()
        .flatten()
        .map(|tweet| &tweet.user)
        .find(|user| user.screen_name.eq_ignore_ascii_case(&username));

    let source = finish_source(
        ctx,
        source,
        SourceMeta {
            id: source.id_for(&profile_url),
            title: owner
                .map(|user| user.name.clone())
                .unwrap_or_else(|| format!("@{username}")),
            link: Some(profile_url.clone()),
            icon: owner.and_then(|user| user.profile_image_url_https.clone()),
            options: None,
        },
    )
    .await;

    let updated_at = source.last_updated();
    let mut items = Vec::new();
    for (index, tweet) in tweets.iter().enumerate() {
        let Some(tweet) = tweet else {
            tracing::debug!("Dropping malformed tweet {} of {}", index, source.id);
            continue;
        };
        let link = format!("https://x.com/{}/status/{}", tweet.user.screen_name, tweet.id_str);
        let timestamp = tweet.created_at();
        let candidate = Candidate::new(None, Some(link.as_str()), timestamp).untitled();
        if should_skip(index, &candidate, updated_at) {
            continue;
        }
        let Some(timestamp) = timestamp else {
            continue;
        };

        let shown = tweet.retweeted_status.as_deref().unwrap_or(tweet);
        let mut item = Item::new(&source, &tweet.id_str, timestamp.timestamp());
        item.link = Some(link);
        item.description = shown.text().map(String::from);
        item.author = Some(format!("{} (@{})", shown.user.name, shown.user.screen_name));

        let (images, videos) = split_media(tweet.media());
        item.media = images.first().cloned();
        item.set_option_urls("images", images);
        item.set_option_urls("videos", videos);

        items.push(item);
    }

    Ok(Normalized { source, items })
}

/// Screen name from `@user`, `user` or a profile url.
pub fn username(input: &str) -> Result<String> {
    let input = input.trim();
    let invalid = || TributaryError::validation(format!("{input} is not an X username"));

    let candidate = match input.strip_prefix('@') {
        Some(name) => name.to_string(),
        None if USERNAME.is_match(input) => input.to_string(),
        None => {
            let url = parse_user_url(input)?;
            if !HOSTS.contains(&bare_host(&url).as_str()) {
                return Err(invalid());
            }
            path_segments(&url).first().map(|s| s.to_string()).ok_or_else(invalid)?
        }
    };

    if USERNAME.is_match(&candidate) {
        Ok(candidate)
    } else {
        Err(invalid())
    }
}

/// Tweets in timeline order. Entries that do not decode as a tweet are kept
/// as `None` so positions still count toward the per-poll limit.
fn parse_timeline(html: &str) -> Result<Vec<Option<Tweet>>> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("script#__NEXT_DATA__")
        .map_err(|e| TributaryError::Other(format!("invalid selector: {e}")))?;
    let script = document
        .select(&selector)
        .next()
        .ok_or_else(|| TributaryError::FeedGetAndParse("timeline has no __NEXT_DATA__".into()))?;

    let json: String = script.text().collect();
    let data: NextData = serde_json::from_str(&json)
        .map_err(|e| TributaryError::FeedGetAndParse(format!("invalid timeline data: {e}")))?;

    Ok(data
        .props
        .page_props
        .timeline
        .entries
        .into_iter()
        .filter_map(|entry| entry.content.and_then(|content| content.tweet))
        .map(|tweet| serde_json::from_value(tweet).ok())
        .collect())
}

/// Photo urls, and for each video its mp4 variant with the highest bitrate.
fn split_media(media: &[TweetMedia]) -> (Vec<String>, Vec<String>) {
    let mut images = Vec::new();
    let mut videos = Vec::new();

    for m in media {
        match m.kind.as_str() {
            "photo" => images.extend(m.media_url_https.clone()),
            "video" | "animated_gif" => {
                let best = m
                    .video_info
                    .iter()
                    .flat_map(|info| info.variants.iter())
                    .filter(|v| v.content_type == "video/mp4")
                    .max_by_key(|v| v.bitrate.unwrap_or(0));
                videos.extend(best.map(|v| v.url.clone()));
            }
            _ => {}
        }
    }

    (images, videos)
}
