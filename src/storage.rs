use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::config::SiteConfig;

/// Where the site configuration lives between restarts.
#[async_trait]
pub trait ConfigStorage: Send + Sync {
    async fn load(&self) -> Result<SiteConfig>;
    async fn save(&self, config: &SiteConfig) -> Result<()>;
}

/// Config file on disk. `.toml` files are read and written as TOML, anything else as JSON.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

    /// `config.json` in the platform config directory, or `./config.json` if there is none.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("", "", "vodhub")
            .map(|d| d.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    }

    pub fn path(&self) -> &Path { &self.path }

    fn is_toml(&self) -> bool {
        self.path.extension().and_then(|s| s.to_str()).is_some_and(|e| e.eq_ignore_ascii_case("toml"))
    }
}

#[async_trait]
impl ConfigStorage for FileStorage {
    /// Missing file means a fresh install: start from defaults.
    async fn load(&self) -> Result<SiteConfig> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(SiteConfig::default()),
            Err(e) => return Err(e).with_context(|| format!("reading {}", self.path.display())),
        };
        let config = if self.is_toml() {
            toml::from_str(&text).with_context(|| format!("parsing {}", self.path.display()))?
        } else {
            serde_json::from_str(&text).with_context(|| format!("parsing {}", self.path.display()))?
        };
        Ok(config)
    }

    async fn save(&self, config: &SiteConfig) -> Result<()> {
        let text = if self.is_toml() { toml::to_string_pretty(config)? } else { serde_json::to_string_pretty(config)? };
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await.with_context(|| format!("creating {}", dir.display()))?;
        }
        // write beside the target and rename so readers never see a half-written file
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, text).await.with_context(|| format!("writing {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path).await.with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}
