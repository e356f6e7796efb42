//! Source options.
//!
//! [`SourceOptions`] mirrors the stored JSON: one optional key per platform.
//! [`PlatformOptions`] is what adapters work with: exactly one validated
//! variant, selected by the source type.

use serde::{Deserialize, Serialize};

use crate::app::{Result, TributaryError};
use crate::domain::SourceType;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<GithubOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub googlenews: Option<GoogleNewsOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mastodon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lemmy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinterest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub podcast: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reddit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stackoverflow: Option<StackOverflowOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tumblr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fourchan: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GithubOptions {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participating: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoogleNewsOptions {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ceid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hl: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StackOverflowOptions {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
}

/// Validated options, one variant per supported platform.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformOptions {
    Rss(String),
    Github(GithubMode),
    GoogleNews(GoogleNewsQuery),
    Mastodon(String),
    Lemmy(String),
    Pinterest(String),
    Podcast(String),
    Reddit(String),
    StackOverflow(StackOverflowQuery),
    Tumblr(String),
    FourChan(String),
    X(String),
    Youtube(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum GithubMode {
    Notifications { participating: bool },
    RepositoryNotifications { repository: String, participating: bool },
    SearchIssuesAndPullRequests { query_name: String, query: String },
    UserActivities { user: String },
    RepositoryActivities { repository: String },
    OrganizationActivities { organization: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum GoogleNewsQuery {
    Url(String),
    Search {
        search: String,
        ceid: Option<String>,
        gl: Option<String>,
        hl: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum StackOverflowQuery {
    Url(String),
    Tag { tag: String, sort: String },
}

impl SourceOptions {
    pub fn rss(url: impl Into<String>) -> Self {
        Self {
            rss: Some(url.into()),
            ..Default::default()
        }
    }

    /// Pick the key belonging to `source_type` and validate it.
    pub fn resolve(&self, source_type: SourceType) -> Result<PlatformOptions> {
        let resolved = match source_type {
            SourceType::Rss => PlatformOptions::Rss(required(&self.rss, "rss")?),
            SourceType::Github => PlatformOptions::Github(resolve_github(self.github.as_ref())?),
            SourceType::GoogleNews => {
                PlatformOptions::GoogleNews(resolve_googlenews(self.googlenews.as_ref())?)
            }
            SourceType::Mastodon => PlatformOptions::Mastodon(required(&self.mastodon, "mastodon")?),
            SourceType::Lemmy => PlatformOptions::Lemmy(required(&self.lemmy, "lemmy")?),
            SourceType::Pinterest => PlatformOptions::Pinterest(required(&self.pinterest, "pinterest")?),
            SourceType::Podcast => PlatformOptions::Podcast(required(&self.podcast, "podcast")?),
            SourceType::Reddit => PlatformOptions::Reddit(required(&self.reddit, "reddit")?),
            SourceType::StackOverflow => {
                PlatformOptions::StackOverflow(resolve_stackoverflow(self.stackoverflow.as_ref())?)
            }
            SourceType::Tumblr => PlatformOptions::Tumblr(required(&self.tumblr, "tumblr")?),
            SourceType::FourChan => PlatformOptions::FourChan(required(&self.fourchan, "fourchan")?),
            SourceType::X => PlatformOptions::X(required(&self.x, "x")?),
            SourceType::Youtube => PlatformOptions::Youtube(required(&self.youtube, "youtube")?),
            SourceType::Medium | SourceType::Nitter | SourceType::None => {
                return Err(TributaryError::validation(format!(
                    "source type {} is not supported",
                    source_type
                )))
            }
        };

        Ok(resolved)
    }
}

fn required(value: &Option<String>, key: &str) -> Result<String> {
    non_empty(value.as_deref()).ok_or_else(|| TributaryError::validation(format!("{key} is required")))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

fn resolve_github(options: Option<&GithubOptions>) -> Result<GithubMode> {
    let options = options.ok_or_else(|| TributaryError::validation("github is required"))?;
    let participating = options.participating.unwrap_or(false);
    let field = |value: &Option<String>, name: &str| {
        non_empty(value.as_deref())
            .ok_or_else(|| TributaryError::validation(format!("github.{name} is required")))
    };

    let mode = match options.kind.as_str() {
        "notifications" => GithubMode::Notifications { participating },
        "repositorynotifications" => GithubMode::RepositoryNotifications {
            repository: field(&options.repository, "repository")?,
            participating,
        },
        "searchissuesandpullrequests" => GithubMode::SearchIssuesAndPullRequests {
            query_name: field(&options.query_name, "queryName")?,
            query: field(&options.query, "query")?,
        },
        "useractivities" => GithubMode::UserActivities {
            user: field(&options.user, "user")?,
        },
        "repositoryactivities" => GithubMode::RepositoryActivities {
            repository: field(&options.repository, "repository")?,
        },
        "organizationactivities" => GithubMode::OrganizationActivities {
            organization: field(&options.organization, "organization")?,
        },
        other => {
            return Err(TributaryError::validation(format!(
                "unsupported github type: {other}"
            )))
        }
    };

    Ok(mode)
}

fn resolve_googlenews(options: Option<&GoogleNewsOptions>) -> Result<GoogleNewsQuery> {
    let options = options.ok_or_else(|| TributaryError::validation("googlenews is required"))?;

    match options.kind.as_str() {
        "url" => non_empty(options.url.as_deref())
            .map(GoogleNewsQuery::Url)
            .ok_or_else(|| TributaryError::validation("googlenews.url is required")),
        "search" => {
            let search = non_empty(options.search.as_deref())
                .ok_or_else(|| TributaryError::validation("googlenews.search is required"))?;
            Ok(GoogleNewsQuery::Search {
                search,
                ceid: non_empty(options.ceid.as_deref()),
                gl: non_empty(options.gl.as_deref()),
                hl: non_empty(options.hl.as_deref()),
            })
        }
        other => Err(TributaryError::validation(format!(
            "unsupported googlenews type: {other}"
        ))),
    }
}

fn resolve_stackoverflow(options: Option<&StackOverflowOptions>) -> Result<StackOverflowQuery> {
    let options = options.ok_or_else(|| TributaryError::validation("stackoverflow is required"))?;

    match options.kind.as_str() {
        "url" => non_empty(options.url.as_deref())
            .map(StackOverflowQuery::Url)
            .ok_or_else(|| TributaryError::validation("stackoverflow.url is required")),
        "tag" => {
            let tag = non_empty(options.tag.as_deref())
                .ok_or_else(|| TributaryError::validation("stackoverflow.tag is required"))?;
            let sort = non_empty(options.sort.as_deref()).unwrap_or_else(|| "newest".to_string());
            Ok(StackOverflowQuery::Tag { tag, sort })
        }
        other => Err(TributaryError::validation(format!(
            "unsupported stackoverflow type: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_rss() {
        let options = SourceOptions::rss(" https://example.com/feed.xml ");
        assert_eq!(
            options.resolve(SourceType::Rss).unwrap(),
            PlatformOptions::Rss("https://example.com/feed.xml".into())
        );
    }

    #[test]
    fn test_resolve_wrong_key_is_validation_error() {
        let options = SourceOptions::rss("https://example.com/feed.xml");
        let err = options.resolve(SourceType::Reddit).unwrap_err();
        assert!(matches!(err, TributaryError::FeedValidation(_)));
    }

    #[test]
    fn test_resolve_empty_string() {
        let options = SourceOptions::rss("   ");
        assert!(matches!(
            options.resolve(SourceType::Rss),
            Err(TributaryError::FeedValidation(_))
        ));
    }

    #[test]
    fn test_placeholder_types_rejected() {
        let options = SourceOptions::rss("https://medium.com/feed/@x");
        for source_type in [SourceType::Medium, SourceType::Nitter, SourceType::None] {
            assert!(matches!(
                options.resolve(source_type),
                Err(TributaryError::FeedValidation(_))
            ));
        }
    }

    #[test]
    fn test_resolve_github_modes() {
        let json = r#"{"github": {"type": "repositorynotifications", "repository": "rust-lang/rust", "participating": true}}"#;
        let options: SourceOptions = serde_json::from_str(json).unwrap();
        assert_eq!(
            options.resolve(SourceType::Github).unwrap(),
            PlatformOptions::Github(GithubMode::RepositoryNotifications {
                repository: "rust-lang/rust".into(),
                participating: true,
            })
        );

        let json = r#"{"github": {"type": "searchissuesandpullrequests", "queryName": "Mine", "query": "is:open author:me"}}"#;
        let options: SourceOptions = serde_json::from_str(json).unwrap();
        assert!(matches!(
            options.resolve(SourceType::Github).unwrap(),
            PlatformOptions::Github(GithubMode::SearchIssuesAndPullRequests { .. })
        ));
    }

    #[test]
    fn test_resolve_github_missing_subfield() {
        let json = r#"{"github": {"type": "useractivities"}}"#;
        let options: SourceOptions = serde_json::from_str(json).unwrap();
        let err = options.resolve(SourceType::Github).unwrap_err();
        assert_eq!(err.to_string(), "Invalid source options: github.user is required");
    }

    #[test]
    fn test_resolve_github_unknown_type() {
        let json = r#"{"github": {"type": "stars"}}"#;
        let options: SourceOptions = serde_json::from_str(json).unwrap();
        assert!(matches!(
            options.resolve(SourceType::Github),
            Err(TributaryError::FeedValidation(_))
        ));
    }

    #[test]
    fn test_resolve_stackoverflow_default_sort() {
        let json = r#"{"stackoverflow": {"type": "tag", "tag": "rust"}}"#;
        let options: SourceOptions = serde_json::from_str(json).unwrap();
        assert_eq!(
            options.resolve(SourceType::StackOverflow).unwrap(),
            PlatformOptions::StackOverflow(StackOverflowQuery::Tag {
                tag: "rust".into(),
                sort: "newest".into(),
            })
        );
    }

    #[test]
    fn test_serialize_skips_empty_keys() {
        let options = SourceOptions::rss("https://example.com/feed.xml");
        let json = serde_json::to_string(&options).unwrap();
        assert_eq!(json, r#"{"rss":"https://example.com/feed.xml"}"#);
    }
}
