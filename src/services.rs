//! Capabilities provided by the host application: an optional cache, the
//! icon uploader and secret decryption.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::Source;

/// Best-effort key/value cache. Misses and failures are indistinguishable to
/// callers and never fail a poll.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn set_best_effort(&self, key: &str, value: &str);
}

/// A cache that never stores anything.
#[derive(Debug, Default)]
pub struct NoopCache;

#[async_trait]
impl Cache for NoopCache {
    async fn get(&self, _key: &str) -> Option<String> {
        None
    }

    async fn set_best_effort(&self, _key: &str, _value: &str) {}
}

/// Process-local cache, handy for the CLI and tests.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    async fn set_best_effort(&self, key: &str, value: &str) {
        match self.entries.lock() {
            Ok(mut entries) => {
                entries.insert(key.to_string(), value.to_string());
            }
            Err(e) => tracing::warn!("Cache write for {} failed: {}", key, e),
        }
    }
}

/// Persists a source icon and returns the path it is served from.
#[async_trait]
pub trait IconUploader: Send + Sync {
    async fn upload(&self, source: &Source, icon_url: &str) -> Result<String>;
}

/// Keeps remote icon urls as they are.
#[derive(Debug, Default)]
pub struct RemoteIcons;

#[async_trait]
impl IconUploader for RemoteIcons {
    async fn upload(&self, _source: &Source, icon_url: &str) -> Result<String> {
        Ok(icon_url.to_string())
    }
}

/// `<userId>/<sourceId>.<ext>` inside the sources bucket.
pub fn icon_storage_path(user_id: &str, source_id: &str, extension: &str) -> String {
    format!("{}/{}.{}", user_id, source_id, extension.trim_start_matches('.'))
}

/// Upload `icon_url` for `source`, falling back to the remote url when the
/// upload fails.
pub async fn upload_icon(
    uploader: &dyn IconUploader,
    source: &Source,
    icon_url: Option<String>,
) -> Option<String> {
    let icon_url = icon_url?;
    match uploader.upload(source, &icon_url).await {
        Ok(path) => Some(path),
        Err(e) => {
            tracing::warn!("Failed to upload icon {} for {}: {}", icon_url, source.id, e);
            Some(icon_url)
        }
    }
}

/// Decrypts secrets stored encrypted in user profiles.
pub trait Decrypt: Send + Sync {
    fn decrypt(&self, ciphertext: &str) -> Result<String>;
}

/// For secrets that are stored unencrypted, e.g. when running locally.
#[derive(Debug, Default)]
pub struct PlaintextSecrets;

impl Decrypt for PlaintextSecrets {
    fn decrypt(&self, ciphertext: &str) -> Result<String> {
        Ok(ciphertext.to_string())
    }
}
