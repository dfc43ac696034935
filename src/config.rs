use crate::gateway::ClientConfig;
use crate::pipeline::DEFAULT_PAGE_SIZE;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CONFIG_PATH_ENV: &str = "HBNB_CONFIG";
const API_URL_ENV: &str = "HBNB_API_URL";
const SESSION_PATH_ENV: &str = "HBNB_SESSION_PATH";
const PAGE_SIZE_ENV: &str = "HBNB_PAGE_SIZE";

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    pub client: ClientConfig,
    /// Where the login token is kept between runs
    pub session_path: PathBuf,
    pub page_size: usize,
    /// How many places a featured tab shows
    pub featured_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            session_path: PathBuf::from(".hbnb_session.json"),
            page_size: DEFAULT_PAGE_SIZE,
            featured_limit: 6,
        }
    }
}

impl Config {
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("Invalid config file")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml(&raw)
    }

    /// Apply `HBNB_*` overrides from an environment lookup
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(API_URL_ENV) {
            self.client.base_url = url;
        }
        if let Some(path) = lookup(SESSION_PATH_ENV) {
            self.session_path = PathBuf::from(path);
        }
        if let Some(size) = lookup(PAGE_SIZE_ENV) {
            self.page_size = size
                .trim()
                .parse()
                .with_context(|| format!("{PAGE_SIZE_ENV} must be a positive number, got '{size}'"))?;
        }
        if self.page_size == 0 {
            anyhow::bail!("page size must be at least 1");
        }
        Ok(self)
    }
}

/// Load `.env`, then the TOML file named by `HBNB_CONFIG` if any, then env overrides
pub fn read_config() -> Result<Config> {
    dotenvy::dotenv().ok();

    let base = match env::var(CONFIG_PATH_ENV) {
        Ok(path) => {
            info!("Reading config from {}", path);
            Config::from_file(Path::new(&path))?
        }
        Err(_) => {
            debug!("{CONFIG_PATH_ENV} not set, using defaults");
            Config::default()
        }
    };

    base.apply_overrides(|key| env::var(key).ok())
}
