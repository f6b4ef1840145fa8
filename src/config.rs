use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use url::Url;

use crate::error::ConfigError;
use crate::types::Source;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Everything the service can be configured with. Replaced wholesale, never patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default)]
    pub site_name: String,
    #[serde(default)]
    pub pc_background_image_url: String,
    #[serde(default)]
    pub phone_background_image_url: String,
    /// Shared per-source timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default)]
    pub base_urls: Vec<Source>,
}

fn default_timeout() -> u64 { DEFAULT_TIMEOUT_SECS }

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_name: String::new(),
            pc_background_image_url: String::new(),
            phone_background_image_url: String::new(),
            timeout: DEFAULT_TIMEOUT_SECS,
            base_urls: Vec::new(),
        }
    }
}

impl SiteConfig {
    pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout) }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout == 0 { return Err(ConfigError::ZeroTimeout); }
        for (i, s) in self.base_urls.iter().enumerate() {
            if s.name.trim().is_empty() { return Err(ConfigError::EmptySourceName(i)); }
            let ok = Url::parse(&s.base_url).map(|u| matches!(u.scheme(), "http" | "https")).unwrap_or(false);
            if !ok { return Err(ConfigError::InvalidBaseUrl { name: s.name.clone(), base_url: s.base_url.clone() }); }
            if s.timeout == Some(0) { return Err(ConfigError::ZeroTimeout); }
        }
        Ok(())
    }

    /// Apply `VODHUB_TIMEOUT_SECS` if it is set to a positive integer.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(t) = std::env::var("VODHUB_TIMEOUT_SECS").ok().and_then(|s| s.parse::<u64>().ok()).filter(|t| *t > 0) {
            self.timeout = t;
        }
        self
    }
}

/// Holds the current configuration as an immutable snapshot.
///
/// Readers clone the `Arc` and keep using that snapshot even if a writer swaps in a new
/// one; the lock is only held for the pointer copy or swap.
#[derive(Debug, Default)]
pub struct ConfigStore {
    current: RwLock<Arc<SiteConfig>>,
}

impl ConfigStore {
    pub fn new(config: SiteConfig) -> Self { Self { current: RwLock::new(Arc::new(config)) } }

    pub fn snapshot(&self) -> Arc<SiteConfig> {
        // a poisoned lock still holds a complete Arc, so keep serving it
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Validate and swap. Returns the snapshot that was replaced.
    pub fn replace(&self, config: SiteConfig) -> Result<Arc<SiteConfig>, ConfigError> {
        config.validate()?;
        let next = Arc::new(config);
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Ok(std::mem::replace(&mut *guard, next))
    }
}
