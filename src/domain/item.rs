use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::Source;
use crate::identity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub user_id: String,
    pub column_id: String,
    pub source_id: String,
    pub title: Option<String>,
    pub link: Option<String>,
    pub media: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    /// Extra media when one url in `media` is not enough (`images`, `videos`, `audio`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Map<String, Value>>,
    pub published_at: i64,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub is_bookmarked: bool,
}

impl Item {
    /// Create an item for `source`; the id is derived from the source id and
    /// the entry identifier (guid, else link).
    pub fn new(source: &Source, entry_identifier: &str, published_at: i64) -> Self {
        Self {
            id: identity::item_id(&source.id, entry_identifier),
            user_id: source.user_id.clone(),
            column_id: source.column_id.clone(),
            source_id: source.id.clone(),
            title: None,
            link: None,
            media: None,
            description: None,
            author: None,
            options: None,
            published_at,
            is_read: false,
            is_bookmarked: false,
        }
    }

    /// Store a list of urls under `options[key]`. Empty lists are ignored.
    pub fn set_option_urls(&mut self, key: &str, urls: Vec<String>) {
        if urls.is_empty() {
            return;
        }
        let values = urls.into_iter().map(Value::String).collect();
        self.options
            .get_or_insert_with(Map::new)
            .insert(key.to_string(), Value::Array(values));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SourceOptions, SourceType};

    fn source() -> Source {
        let mut source = Source::new(SourceType::Rss, "u", "c", SourceOptions::default());
        source.id = "rss-u-c-abc".into();
        source
    }

    #[test]
    fn test_item_copies_parent_fields() {
        let item = Item::new(&source(), "entry-1", 1_700_000_000);
        assert_eq!(item.source_id, "rss-u-c-abc");
        assert_eq!(item.user_id, "u");
        assert_eq!(item.column_id, "c");
        assert!(item.id.starts_with("rss-u-c-abc-"));
        assert!(!item.is_read);
        assert!(!item.is_bookmarked);
    }

    #[test]
    fn test_item_id_determinism() {
        let a = Item::new(&source(), "entry-1", 1);
        let b = Item::new(&source(), "entry-1", 2);
        let c = Item::new(&source(), "entry-2", 1);
        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
    }

    #[test]
    fn test_set_option_urls() {
        let mut item = Item::new(&source(), "e", 0);
        item.set_option_urls("videos", Vec::new());
        assert!(item.options.is_none());

        item.set_option_urls("videos", vec!["https://video/1.mp4".into()]);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["options"]["videos"][0], "https://video/1.mp4");
        assert_eq!(json["publishedAt"], 0);
    }
}
