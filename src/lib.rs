pub mod aggregator;
pub mod config;
pub mod error;
pub mod mapping;
pub mod server;
pub mod storage;
pub mod types;

// --- Library API for embedding ---

/// Convenience re-exports for embedders.
pub mod prelude {
    pub use crate::aggregator::{Aggregator, SearchStream};
    pub use crate::config::{ConfigStore, SiteConfig};
    pub use crate::storage::{ConfigStorage, FileStorage};
    pub use crate::types::{Episode, RawCatalogEntry, Source, SourceResult, Title};
    pub use crate::VodHub;
}

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::aggregator::{Aggregator, SearchStream};
use crate::config::{ConfigStore, SiteConfig};
use crate::storage::ConfigStorage;
use crate::types::Source;

/// Async library entry point. Owns the live configuration, its storage and the search engine.
pub struct VodHub {
    config: ConfigStore,
    storage: Box<dyn ConfigStorage>,
    aggregator: Aggregator,
    // serializes save + swap so disk and memory cannot disagree after racing updates
    update_lock: Mutex<()>,
}

impl VodHub {
    /// Load configuration from storage (env overrides applied) and build the engine.
    pub async fn open(storage: impl ConfigStorage + 'static) -> Result<Self> {
        let config = storage.load().await?.with_env_overrides();
        Self::new(config, storage)
    }

    pub fn new(config: SiteConfig, storage: impl ConfigStorage + 'static) -> Result<Self> {
        config.validate()?;
        info!(sources = config.base_urls.len(), timeout_secs = config.timeout, "configuration loaded");
        Ok(Self {
            config: ConfigStore::new(config),
            storage: Box::new(storage),
            aggregator: Aggregator::new()?,
            update_lock: Mutex::new(()),
        })
    }

    /// The current configuration snapshot.
    pub fn config(&self) -> Arc<SiteConfig> { self.config.snapshot() }

    pub fn sources(&self) -> Vec<Source> { self.config.snapshot().base_urls.clone() }

    /// Search every configured source. The source list is captured once, so a concurrent
    /// [`update_config`](Self::update_config) does not affect a search already under way.
    pub fn search(&self, keyword: &str) -> SearchStream {
        let snapshot = self.config.snapshot();
        self.aggregator.search(keyword, &snapshot.base_urls, snapshot.timeout())
    }

    /// Validate, persist, then swap in a new configuration.
    ///
    /// On any error the previous configuration stays live.
    pub async fn update_config(&self, config: SiteConfig) -> Result<Arc<SiteConfig>> {
        config.validate()?;
        let _guard = self.update_lock.lock().await;
        self.storage.save(&config).await?;
        let sources = config.base_urls.len();
        self.config.replace(config)?;
        info!(sources, "configuration replaced");
        Ok(self.config.snapshot())
    }
}
