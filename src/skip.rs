//! Incremental filter deciding which entries of a poll are ingested.

use chrono::{DateTime, Utc};

/// Only the first entries of a feed, in feed order, are ingested per poll.
pub const MAX_ITEMS_PER_POLL: usize = 50;

/// Entries up to this many seconds older than the last poll are still treated
/// as seen, absorbing clock skew between polls.
pub const STALE_GRACE_SECS: i64 = 10;

/// The fields of an entry the filter looks at, whatever the platform calls them.
#[derive(Debug, Clone, Default)]
pub struct Candidate<'a> {
    pub title: Option<&'a str>,
    pub link: Option<&'a str>,
    pub timestamp: Option<DateTime<Utc>>,
    pub title_required: bool,
}

impl<'a> Candidate<'a> {
    pub fn new(title: Option<&'a str>, link: Option<&'a str>, timestamp: Option<DateTime<Utc>>) -> Self {
        Self {
            title,
            link,
            timestamp,
            title_required: true,
        }
    }

    /// For platforms whose entries routinely have no title.
    pub fn untitled(mut self) -> Self {
        self.title_required = false;
        self
    }
}

/// Returns true when the entry at `index` must not be ingested.
pub fn should_skip(index: usize, candidate: &Candidate<'_>, source_updated_at: i64) -> bool {
    if index >= MAX_ITEMS_PER_POLL {
        return true;
    }

    if candidate.title_required && is_blank(candidate.title) {
        return true;
    }

    if is_blank(candidate.link) {
        return true;
    }

    match candidate.timestamp {
        Some(timestamp) => timestamp.timestamp() <= source_updated_at - STALE_GRACE_SECS,
        None => true,
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map(|v| v.trim().is_empty()).unwrap_or(true)
}
