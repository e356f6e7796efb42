//! Favicon discovery.
//!
//! A single pass: load the page, collect `<link rel="icon">`-style candidates
//! (plus `/favicon.ico`), probe them concurrently and keep the largest real
//! image. Every failure means "no favicon", never an error.

use futures::future::join_all;
use scraper::{Html, Selector};
use url::Url;

use crate::config::FetchConfig;
use crate::fetcher::{Fetcher, Request};

/// `rel` values that point at an icon.
pub const FAVICON_RELS: [&str; 5] = [
    "icon",
    "shortcut icon",
    "apple-touch-icon",
    "apple-touch-icon-precomposed",
    "fluid-icon",
];

pub const ALLOWED_EXTENSIONS: [&str; 6] = ["ico", "png", "jpg", "jpeg", "gif", "webp"];

#[derive(Debug, Clone, PartialEq)]
pub struct Favicon {
    pub url: String,
    pub rel: String,
    pub content_type: String,
    pub extension: String,
    pub size: u64,
}

/// Extra constraint a caller can put on candidates, e.g. a minimum size.
pub type FaviconFilter<'a> = &'a (dyn Fn(&Favicon) -> bool + Sync);

/// Find the best favicon for the page at `page_url`.
pub async fn resolve(
    fetcher: &(dyn Fetcher + Send + Sync),
    config: &FetchConfig,
    page_url: &str,
    filter: Option<FaviconFilter<'_>>,
) -> Option<Favicon> {
    let page = normalize_page_url(page_url)?;

    let response = match fetcher
        .fetch(&Request::get(page.as_str(), config.favicon_timeout()))
        .await
    {
        Ok(response) if response.is_success() => response,
        Ok(response) => {
            tracing::debug!("Favicon page {} returned HTTP {}", page, response.status);
            return None;
        }
        Err(e) => {
            tracing::debug!("Favicon page {} failed: {}", page, e);
            return None;
        }
    };

    let candidates = extract_candidates(&response.text(), &page);
    if candidates.is_empty() {
        return None;
    }

    let probes = candidates
        .into_iter()
        .map(|(url, rel)| probe(fetcher, config, url, rel));
    let mut favicons: Vec<Favicon> = join_all(probes)
        .await
        .into_iter()
        .flatten()
        .filter(|favicon| filter.map_or(true, |f| f(favicon)))
        .collect();

    favicons.sort_by(|a, b| b.size.cmp(&a.size));
    favicons.into_iter().next()
}

/// Add a scheme when missing and parse.
fn normalize_page_url(input: &str) -> Option<Url> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed.trim_start_matches("//"))
    };
    Url::parse(&with_scheme).ok()
}

/// Candidate `(url, rel)` pairs in document order, `/favicon.ico` last.
pub fn extract_candidates(html: &str, page: &Url) -> Vec<(String, String)> {
    let document = Html::parse_document(html);
    let mut candidates: Vec<(String, String)> = Vec::new();

    if let Ok(selector) = Selector::parse("link[rel][href]") {
        for element in document.select(&selector) {
            let rel = element
                .value()
                .attr("rel")
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase();
            if !FAVICON_RELS.contains(&rel.as_str()) {
                continue;
            }
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            if let Ok(resolved) = page.join(href.trim()) {
                let resolved = resolved.to_string();
                if !candidates.iter().any(|(url, _)| *url == resolved) {
                    candidates.push((resolved, rel));
                }
            }
        }
    }

    if let Ok(default_icon) = page.join("/favicon.ico") {
        let default_icon = default_icon.to_string();
        if !candidates.iter().any(|(url, _)| *url == default_icon) {
            candidates.push((default_icon, "icon".to_string()));
        }
    }

    candidates
}

async fn probe(
    fetcher: &(dyn Fetcher + Send + Sync),
    config: &FetchConfig,
    url: String,
    rel: String,
) -> Option<Favicon> {
    let response = fetcher
        .fetch(&Request::get(url.as_str(), config.probe_timeout()))
        .await
        .ok()
        .filter(|r| r.is_success())?;

    let content_type = response
        .content_type
        .as_deref()?
        .split(';')
        .next()?
        .trim()
        .to_ascii_lowercase();
    if !content_type.starts_with("image/") {
        return None;
    }

    let extension = extension_for(&content_type).or_else(|| url_extension(&url))?;
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return None;
    }

    Some(Favicon {
        size: response.size(),
        url,
        rel,
        content_type,
        extension,
    })
}

fn extension_for(content_type: &str) -> Option<String> {
    let ext = match content_type {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/x-icon" | "image/vnd.microsoft.icon" | "image/ico" => "ico",
        _ => return None,
    };
    Some(ext.to_string())
}

fn url_extension(url: &str) -> Option<String> {
    let path = Url::parse(url).ok()?.path().to_ascii_lowercase();
    path.rsplit_once('.').map(|(_, ext)| ext.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::testing::StaticFetcher;

    const PAGE: &str = r#"<!doctype html>
<html><head>
  <link rel="stylesheet" href="/style.css">
  <link rel="icon" sizes="16x16" href="/icon-16.png">
  <link rel="apple-touch-icon" sizes="152x152" href="https://cdn.example.com/icon-152.png">
</head><body></body></html>"#;

    fn fetcher() -> StaticFetcher {
        StaticFetcher::new()
            .route("https://example.com/", "text/html", PAGE)
            .route("https://example.com/icon-16.png", "image/png", vec![0u8; 300])
            .route("https://cdn.example.com/icon-152.png", "image/png", vec![0u8; 9000])
    }

    #[tokio::test]
    async fn test_largest_icon_wins() {
        let fetcher = fetcher();
        let favicon = resolve(&fetcher, &FetchConfig::default(), "https://example.com/", None)
            .await
            .unwrap();
        assert_eq!(favicon.url, "https://cdn.example.com/icon-152.png");
        assert_eq!(favicon.extension, "png");
        assert_eq!(favicon.size, 9000);
    }

    #[tokio::test]
    async fn test_filter_applies_before_ranking() {
        let fetcher = fetcher();
        let small_only: FaviconFilter<'_> = &|f: &Favicon| f.size < 1000;
        let favicon = resolve(
            &fetcher,
            &FetchConfig::default(),
            "example.com",
            Some(small_only),
        )
        .await
        .unwrap();
        assert_eq!(favicon.url, "https://example.com/icon-16.png");
    }

    #[tokio::test]
    async fn test_non_image_candidates_are_dropped() {
        let fetcher = StaticFetcher::new()
            .route("https://example.com/", "text/html", PAGE)
            .route("https://example.com/icon-16.png", "text/html", "<html>")
            .route("https://example.com/favicon.ico", "image/x-icon", vec![1u8; 50]);
        let favicon = resolve(&fetcher, &FetchConfig::default(), "https://example.com/", None)
            .await
            .unwrap();
        assert_eq!(favicon.url, "https://example.com/favicon.ico");
        assert_eq!(favicon.extension, "ico");
    }

    #[tokio::test]
    async fn test_failures_yield_none() {
        let fetcher = StaticFetcher::new();
        assert!(resolve(&fetcher, &FetchConfig::default(), "https://down.example.com", None)
            .await
            .is_none());

        let fetcher = StaticFetcher::new().status("https://example.com/", 500);
        assert!(resolve(&fetcher, &FetchConfig::default(), "https://example.com/", None)
            .await
            .is_none());

        assert!(resolve(&StaticFetcher::new(), &FetchConfig::default(), "  ", None)
            .await
            .is_none());
    }

    #[test]
    fn test_extract_candidates_resolves_relative_hrefs() {
        let page = Url::parse("https://example.com/blog/post").unwrap();
        let candidates = extract_candidates(
            r#"<link rel="Shortcut Icon" href="favicon.png"><link rel="icon" href="//static.example.com/i.ico">"#,
            &page,
        );
        assert_eq!(
            candidates,
            vec![
                ("https://example.com/blog/favicon.png".to_string(), "shortcut icon".to_string()),
                ("https://static.example.com/i.ico".to_string(), "icon".to_string()),
                ("https://example.com/favicon.ico".to_string(), "icon".to_string()),
            ]
        );
    }
}
