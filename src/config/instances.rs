//! Static platform data: known Lemmy and Mastodon instances, Pinterest
//! domains and 4chan boards.
//!
//! The lists ship inside the binary as `instances.toml` and are parsed once on
//! first use.

use once_cell::sync::Lazy;
use serde::Deserialize;

const BUNDLED: &str = include_str!("instances.toml");

static LISTS: Lazy<StaticLists> = Lazy::new(|| {
    StaticLists::from_toml(BUNDLED).expect("bundled instances.toml must be valid")
});

#[derive(Debug, Clone, Deserialize)]
pub struct StaticLists {
    pub version: u32,
    pub lemmy_instances: Vec<String>,
    pub mastodon_instances: Vec<String>,
    pub pinterest_domains: Vec<String>,
    pub fourchan_boards: Vec<String>,
}

impl StaticLists {
    /// The lists bundled with this build.
    pub fn get() -> &'static StaticLists {
        &LISTS
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn is_lemmy_instance(&self, host: &str) -> bool {
        contains_host(&self.lemmy_instances, host)
    }

    /// `www.pinterest.de` and `pinterest.de` both match.
    pub fn is_pinterest_domain(&self, host: &str) -> bool {
        contains_host(&self.pinterest_domains, host)
    }

    pub fn is_fourchan_board(&self, board: &str) -> bool {
        self.fourchan_boards.iter().any(|b| b == board)
    }
}

fn contains_host(list: &[String], host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    list.iter().any(|h| h == host)
}
