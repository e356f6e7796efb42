use std::sync::Arc;

use crate::app::error::Result;
use crate::config::Config;
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::Fetcher;
use crate::services::{Cache, Decrypt, IconUploader, NoopCache, PlaintextSecrets, RemoteIcons};

/// Everything an adapter may talk to besides its own inputs.
pub struct AppContext {
    pub config: Config,
    pub fetcher: Arc<dyn Fetcher + Send + Sync>,
    pub cache: Arc<dyn Cache>,
    pub icons: Arc<dyn IconUploader>,
    pub secrets: Arc<dyn Decrypt>,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new(&config.fetch)?);
        Ok(Self::with_fetcher(config, fetcher))
    }

    /// A context with the given fetcher, no cache, remote icons and
    /// plaintext secrets.
    pub fn with_fetcher(config: Config, fetcher: Arc<dyn Fetcher + Send + Sync>) -> Self {
        Self {
            config,
            fetcher,
            cache: Arc::new(NoopCache),
            icons: Arc::new(RemoteIcons),
            secrets: Arc::new(PlaintextSecrets),
        }
    }

    pub fn cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn icons(mut self, icons: Arc<dyn IconUploader>) -> Self {
        self.icons = icons;
        self
    }

    pub fn secrets(mut self, secrets: Arc<dyn Decrypt>) -> Self {
        self.secrets = secrets;
        self
    }
}
