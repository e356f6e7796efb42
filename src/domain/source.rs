use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::{Item, SourceOptions};
use crate::identity;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Rss,
    Github,
    GoogleNews,
    Mastodon,
    Lemmy,
    Pinterest,
    Podcast,
    Reddit,
    StackOverflow,
    Tumblr,
    FourChan,
    X,
    Youtube,
    Medium,
    Nitter,
    #[default]
    None,
}

impl SourceType {
    pub const ALL: [SourceType; 16] = [
        SourceType::Rss,
        SourceType::Github,
        SourceType::GoogleNews,
        SourceType::Mastodon,
        SourceType::Lemmy,
        SourceType::Pinterest,
        SourceType::Podcast,
        SourceType::Reddit,
        SourceType::StackOverflow,
        SourceType::Tumblr,
        SourceType::FourChan,
        SourceType::X,
        SourceType::Youtube,
        SourceType::Medium,
        SourceType::Nitter,
        SourceType::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Rss => "rss",
            SourceType::Github => "github",
            SourceType::GoogleNews => "googlenews",
            SourceType::Mastodon => "mastodon",
            SourceType::Lemmy => "lemmy",
            SourceType::Pinterest => "pinterest",
            SourceType::Podcast => "podcast",
            SourceType::Reddit => "reddit",
            SourceType::StackOverflow => "stackoverflow",
            SourceType::Tumblr => "tumblr",
            SourceType::FourChan => "fourchan",
            SourceType::X => "x",
            SourceType::Youtube => "youtube",
            SourceType::Medium => "medium",
            SourceType::Nitter => "nitter",
            SourceType::None => "none",
        }
    }
}

impl FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        SourceType::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| format!("unknown source type: {s}"))
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's subscription to one external feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    #[serde(default)]
    pub id: String,
    pub column_id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub source_type: SourceType,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub options: SourceOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

/// Fields an adapter derives from the remote feed.
#[derive(Debug, Clone, Default)]
pub struct SourceMeta {
    pub id: String,
    pub title: String,
    pub link: Option<String>,
    pub icon: Option<String>,
    /// Normalized options to store instead of the user input.
    pub options: Option<SourceOptions>,
}

impl Source {
    pub fn new(source_type: SourceType, user_id: &str, column_id: &str, options: SourceOptions) -> Self {
        Self {
            source_type,
            user_id: user_id.to_string(),
            column_id: column_id.to_string(),
            options,
            ..Default::default()
        }
    }

    /// The existing id, or a freshly derived one for a source not yet created.
    pub fn id_for(&self, canonical: &str) -> String {
        if self.id.is_empty() {
            identity::source_id(self.source_type, &self.user_id, &self.column_id, canonical)
        } else {
            self.id.clone()
        }
    }

    /// Unix seconds of the last successful poll, `0` if never polled.
    pub fn last_updated(&self) -> i64 {
        self.updated_at.unwrap_or(0)
    }

    /// Build the normalized copy of this source. The input is left untouched.
    pub fn normalized(&self, meta: SourceMeta) -> Source {
        Source {
            id: meta.id,
            column_id: self.column_id.clone(),
            user_id: self.user_id.clone(),
            source_type: self.source_type,
            title: meta.title,
            options: meta.options.unwrap_or_else(|| self.options.clone()),
            link: meta.link,
            icon: meta.icon,
            updated_at: self.updated_at,
        }
    }
}

/// Result of polling one source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Normalized {
    pub source: Source,
    pub items: Vec<Item>,
}
