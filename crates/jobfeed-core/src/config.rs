use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::feed::Source;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub normalize: NormalizeConfig,
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            fetch: FetchConfig::default(),
            normalize: NormalizeConfig::default(),
            sources: default_sources(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Path of the JSON job list
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    /// Log level used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Job lifetime in days for sources without their own `ttl_days`
    #[serde(default = "default_ttl_days")]
    pub default_ttl_days: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            log_level: default_log_level(),
            default_ttl_days: default_ttl_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Per-feed request timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// Number of feeds fetched at once (1 = sequential)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// HTTP proxy URL (e.g., "http://127.0.0.1:7890" or "socks5://127.0.0.1:1080")
    #[serde(default)]
    pub proxy_url: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_timeout(),
            concurrency: default_concurrency(),
            proxy_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeConfig {
    /// Descriptions longer than this many characters are cut and suffixed with "..." (0 = no limit)
    #[serde(default = "default_description_max_chars")]
    pub description_max_chars: usize,
    /// Description used when a feed item has none
    #[serde(default = "default_description")]
    pub default_description: String,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            description_max_chars: default_description_max_chars(),
            default_description: default_description(),
        }
    }
}

/// A `[[sources]]` entry as written in config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub url: String,
    /// Overrides `general.default_ttl_days`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_days: Option<u32>,
    /// Only the first `max_items` entries of the feed are ingested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
}

impl SourceConfig {
    fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            ttl_days: None,
            max_items: None,
        }
    }
}

fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig::new("RemoteOK", "https://remoteok.io/remote-freelance-jobs.rss"),
        SourceConfig::new(
            "We Work Remotely",
            "https://weworkremotely.com/categories/remote-programming-jobs.rss",
        ),
        SourceConfig::new("JustRemote", "https://justremote.co/remote-jobs/rss"),
    ]
}

fn default_store_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("jobfeed")
        .join("jobs.json")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_ttl_days() -> u32 {
    30
}

fn default_timeout() -> u64 {
    10
}

fn default_concurrency() -> usize {
    1
}

fn default_description_max_chars() -> usize {
    300
}

fn default_description() -> String {
    "Check the link for more details".to_string()
}

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

impl AppConfig {
    /// Load configuration from the default location or return defaults
    pub fn load() -> crate::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`; a missing file yields defaults
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get the configuration file path
    /// Always uses ~/.config/jobfeed/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("jobfeed")
            .join("config.toml")
    }

    /// Get the job store path (with tilde expansion)
    pub fn store_path(&self) -> PathBuf {
        expand_tilde(&self.general.store_path)
    }

    /// Validate `[[sources]]` and resolve each one's TTL
    pub fn sources(&self) -> crate::Result<Vec<Source>> {
        let mut seen = HashSet::new();
        let mut sources = Vec::with_capacity(self.sources.len());

        for entry in &self.sources {
            let name = entry.name.trim();
            if name.is_empty() {
                return Err(crate::Error::Config(format!(
                    "source with url '{}' has an empty name",
                    entry.url
                )));
            }
            if !seen.insert(name.to_string()) {
                return Err(crate::Error::Config(format!("duplicate source name '{}'", name)));
            }

            let url = Url::parse(&entry.url)
                .map_err(|e| crate::Error::Config(format!("source '{}': {}", name, e)))?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(crate::Error::Config(format!(
                    "source '{}': feed url must be http or https",
                    name
                )));
            }

            let ttl_days = entry.ttl_days.unwrap_or(self.general.default_ttl_days);
            if !(Source::MIN_TTL_DAYS..=Source::MAX_TTL_DAYS).contains(&ttl_days) {
                return Err(crate::Error::Config(format!(
                    "source '{}': ttl_days must be between {} and {}",
                    name,
                    Source::MIN_TTL_DAYS,
                    Source::MAX_TTL_DAYS
                )));
            }

            sources.push(Source {
                name: name.to_string(),
                url: url.to_string(),
                ttl: chrono::Duration::days(i64::from(ttl_days)),
                max_items: entry.max_items,
            });
        }

        Ok(sources)
    }
}
