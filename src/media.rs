//! Media and description extraction heuristics.

use feed_rs::model::{Entry, MediaContent};
use html_escape::decode_html_entities;
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static IMG_SRC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<img[^>]+src=["'](https://[^"']+)["']"#).expect("Failed to compile img regex")
});

static HTML_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("Failed to compile tag regex"));

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Failed to compile whitespace regex"));

const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "webp", "avif"];
const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "webm", "gifv", "mov"];
const AUDIO_EXTENSIONS: [&str; 6] = ["mp3", "m4a", "aac", "ogg", "opus", "wav"];
const YOUTUBE_HOSTS: [&str; 4] = ["youtube.com", "www.youtube.com", "m.youtube.com", "youtu.be"];

/// Media of a generic feed entry, first match wins:
/// 1. an https, non-svg image from `media:content`, `media:group` or an enclosure
/// 2. an https `media:thumbnail`
/// 3. an image enclosure link
/// 4. the first https `<img>` in the description or content
pub fn entry_media(entry: &Entry) -> Option<String> {
    let content = entry
        .media
        .iter()
        .flat_map(|m| m.content.iter())
        .find_map(image_content_url);
    if content.is_some() {
        return content;
    }

    let thumbnail = entry
        .media
        .iter()
        .flat_map(|m| m.thumbnails.iter())
        .map(|t| t.image.uri.as_str())
        .find(|uri| is_https(uri));
    if let Some(uri) = thumbnail {
        return Some(uri.to_string());
    }

    let enclosure = entry.links.iter().find(|l| {
        l.rel.as_deref() == Some("enclosure")
            && l.media_type.as_deref().is_some_and(|t| t.starts_with("image/"))
            && is_https(&l.href)
    });
    if let Some(link) = enclosure {
        return Some(link.href.clone());
    }

    entry_html(entry).and_then(|html| first_image(&html))
}

/// The first audio url of an entry, from enclosures or media content.
pub fn entry_audio(entry: &Entry) -> Option<String> {
    entry
        .media
        .iter()
        .flat_map(|m| m.content.iter())
        .find(|c| {
            c.content_type
                .as_ref()
                .is_some_and(|t| t.to_string().starts_with("audio/"))
        })
        .and_then(|c| c.url.as_ref().map(|u| u.to_string()))
        .or_else(|| {
            entry
                .links
                .iter()
                .find(|l| l.media_type.as_deref().is_some_and(|t| t.starts_with("audio/")))
                .map(|l| l.href.clone())
        })
}

/// All thumbnail urls of an entry, in document order.
pub fn entry_thumbnails(entry: &Entry) -> Vec<String> {
    entry
        .media
        .iter()
        .flat_map(|m| m.thumbnails.iter())
        .map(|t| t.image.uri.clone())
        .filter(|uri| is_https(uri))
        .collect()
}

/// Description as plain text: summary first, then content.
pub fn entry_description(entry: &Entry) -> Option<String> {
    entry_html(entry)
        .map(|html| strip_html(&html))
        .filter(|text| !text.is_empty())
}

/// The raw description or content html of an entry.
pub fn entry_html(entry: &Entry) -> Option<String> {
    entry
        .summary
        .as_ref()
        .map(|s| s.content.clone())
        .filter(|s| !s.trim().is_empty())
        .or_else(|| entry.content.as_ref().and_then(|c| c.body.clone()))
        .or_else(|| {
            entry
                .media
                .iter()
                .find_map(|m| m.description.as_ref().map(|d| d.content.clone()))
        })
}

/// First `<img src="https://...">` in an html fragment.
pub fn first_image(html: &str) -> Option<String> {
    IMG_SRC
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| decode_html_entities(m.as_str()).to_string())
}

/// Drop tags, decode entities and collapse whitespace.
pub fn strip_html(html: &str) -> String {
    let without_tags = HTML_TAG.replace_all(html, " ");
    let decoded = decode_html_entities(&without_tags);
    WHITESPACE.replace_all(decoded.trim(), " ").into_owned()
}

pub fn is_image_url(url: &str) -> bool {
    has_extension(url, &IMAGE_EXTENSIONS)
}

/// Links Lemmy posts to images, videos or YouTube count as media.
pub fn is_media_url(url: &str) -> bool {
    if is_image_url(url) || has_extension(url, &VIDEO_EXTENSIONS) {
        return true;
    }
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
        .is_some_and(|host| YOUTUBE_HOSTS.contains(&host.as_str()))
}

fn image_content_url(content: &MediaContent) -> Option<String> {
    let url = content.url.as_ref()?.to_string();
    if !is_https(&url) || has_extension(&url, &["svg"]) {
        return None;
    }

    let is_image = match &content.content_type {
        Some(mime) => {
            let mime = mime.to_string();
            mime.starts_with("image/") && !mime.starts_with("image/svg")
        }
        // CDN urls often carry neither a type nor an extension
        None => !has_extension(&url, &VIDEO_EXTENSIONS) && !has_extension(&url, &AUDIO_EXTENSIONS),
    };

    is_image.then_some(url)
}

fn is_https(url: &str) -> bool {
    url.starts_with("https://")
}

fn has_extension(url: &str, extensions: &[&str]) -> bool {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_ascii_lowercase(),
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_ascii_lowercase(),
    };
    path.rsplit_once('.')
        .is_some_and(|(_, ext)| extensions.contains(&ext))
}
