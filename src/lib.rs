//! # Tributary
//!
//! Turns user-configured sources (RSS feeds, podcasts, social timelines,
//! platform APIs) into one canonical source record and a list of items.
//!
//! ## Architecture
//!
//! ```text
//! Source + options → Normalizer → platform adapter → Fetcher → Source + Items
//! ```
//!
//! - [`normalizer`]: Dispatches a source to the adapter of its platform
//! - [`fetcher`]: HTTP boundary, replaceable in tests
//! - [`favicon`]: Finds the best icon of a website
//!
//! ## Quick Start
//!
//! ```bash
//! # Normalize one source
//! tributary normalize source.json --profile profile.json
//!
//! # Poll many sources with 4 workers
//! tributary poll sources.json --workers 4
//!
//! # Find a favicon
//! tributary favicon https://blog.rust-lang.org
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the fetcher,
/// cache, icon uploader and secret decryption used by every adapter.
pub mod app;

/// Configuration loaded from `~/.config/tributary/config.toml`, plus the
/// static lists of known instances.
pub mod config;

/// Command-line interface using clap.
pub mod cli;

/// Core domain models.
///
/// - [`Source`](domain::Source): A configured subscription and its options
/// - [`Item`](domain::Item): One normalized entry
/// - [`Profile`](domain::Profile): Linked accounts of the source owner
pub mod domain;

pub mod favicon;

/// Helpers over parsed feed entries shared by the adapters.
pub mod feed;

/// HTTP fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for requests
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based implementation
pub mod fetcher;

/// md5-based source and item ids.
pub mod identity;

pub mod media;

/// Per-platform normalization.
pub mod normalizer;

/// Collaborators injected into the context: cache, icon upload, secrets.
pub mod services;

/// Rules for dropping items that were already seen.
pub mod skip;
