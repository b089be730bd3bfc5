use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{DirectoryError, Result};

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "vcscore.toml";

pub const ENV_DYNAMIC_SOURCE: &str = "VCSCORE_DYNAMIC_SOURCE";
pub const ENV_PORTFOLIO_CSV: &str = "VCSCORE_PORTFOLIO_CSV";
pub const ENV_PAGE_SIZE: &str = "VCSCORE_PAGE_SIZE";
pub const ENV_LOGO_CACHE: &str = "VCSCORE_LOGO_CACHE";

/// Where a remote-or-local resource lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    Url(String),
    File(PathBuf),
}

impl SourceLocation {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            Self::Url(raw.to_string())
        } else {
            Self::File(PathBuf::from(raw))
        }
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Top-level configuration for loading and paging the directory
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Records shown per page
    pub page_size: usize,

    /// Admin-maintained records (URL or JSON file); `None` disables the source
    pub dynamic_source: Option<String>,

    /// Portfolio CSV export (URL or file)
    pub portfolio_csv: String,

    /// Logo resolution settings
    pub logo: LogoConfig,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            page_size: 50,
            dynamic_source: Some("http://localhost:3001/api/companies".to_string()),
            portfolio_csv: "public/VCSCORE_v2.csv".to_string(),
            logo: LogoConfig::default(),
        }
    }
}

impl DirectoryConfig {
    /// Load from an explicit file, or `vcscore.toml` when present, then apply
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.is_file() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw)
            .map_err(|err| DirectoryError::config(format!("{}: {err}", path.display())))
    }

    /// Environment lookup is injected so tests don't touch process state.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(raw) = lookup(ENV_DYNAMIC_SOURCE) {
            let raw = raw.trim();
            self.dynamic_source = if raw.is_empty() || raw.eq_ignore_ascii_case("none") {
                None
            } else {
                Some(raw.to_string())
            };
        }
        if let Some(raw) = lookup(ENV_PORTFOLIO_CSV) {
            self.portfolio_csv = raw.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_PAGE_SIZE) {
            self.page_size = raw.trim().parse().map_err(|_| {
                DirectoryError::config(format!("{ENV_PAGE_SIZE} must be a positive integer"))
            })?;
        }
        if let Some(raw) = lookup(ENV_LOGO_CACHE) {
            self.logo.cache_path = Some(PathBuf::from(raw.trim()));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(DirectoryError::config("page_size must be > 0"));
        }
        self.logo.validate()
    }

    pub fn dynamic_location(&self) -> Option<SourceLocation> {
        self.dynamic_source.as_deref().map(SourceLocation::parse)
    }

    pub fn portfolio_location(&self) -> SourceLocation {
        SourceLocation::parse(&self.portfolio_csv)
    }
}

/// Logo lookup table, palette, cache and probe pacing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogoConfig {
    /// Persisted cache file; `None` keeps the cache in memory only
    pub cache_path: Option<PathBuf>,

    /// Lifetime of a cache entry
    pub ttl_secs: u64,

    /// Names probed concurrently per batch
    pub batch_size: usize,

    /// Pause between batches
    pub batch_pause_ms: u64,

    /// External logo service, queried as `<probe_base>/<domain>`
    pub probe_base: String,

    /// Known logos keyed by the name with non-word characters stripped
    pub manual_logos: BTreeMap<String, String>,

    /// Avatar background colors
    pub palette: Vec<String>,
}

impl Default for LogoConfig {
    fn default() -> Self {
        Self {
            cache_path: None,
            ttl_secs: 24 * 60 * 60,
            batch_size: 5,
            batch_pause_ms: 100,
            probe_base: "https://logo.clearbit.com".to_string(),
            manual_logos: default_manual_logos(),
            palette: default_palette(),
        }
    }
}

impl LogoConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn batch_pause(&self) -> Duration {
        Duration::from_millis(self.batch_pause_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(DirectoryError::config("logo.batch_size must be > 0"));
        }
        if self.palette.is_empty() {
            return Err(DirectoryError::config("logo.palette must not be empty"));
        }
        Ok(())
    }
}

fn default_manual_logos() -> BTreeMap<String, String> {
    [
        ("openai", "openai.com"),
        ("google", "google.com"),
        ("microsoft", "microsoft.com"),
        ("apple", "apple.com"),
        ("meta", "meta.com"),
        ("amazon", "amazon.com"),
        ("netflix", "netflix.com"),
        ("uber", "uber.com"),
        ("airbnb", "airbnb.com"),
        ("stripe", "stripe.com"),
        ("spotify", "spotify.com"),
        ("slack", "slack.com"),
        ("zoom", "zoom.us"),
        ("dropbox", "dropbox.com"),
        ("github", "github.com"),
        ("linkedin", "linkedin.com"),
        ("twitter", "twitter.com"),
        ("instagram", "instagram.com"),
        ("tiktok", "tiktok.com"),
        ("snapchat", "snapchat.com"),
        ("sequoia", "sequoiacap.com"),
        ("a16z", "a16z.com"),
        ("kleinerperkins", "kleinerperkins.com"),
        ("accel", "accel.com"),
    ]
    .into_iter()
    .map(|(key, domain)| (key.to_string(), format!("https://logo.clearbit.com/{domain}")))
    .collect()
}

fn default_palette() -> Vec<String> {
    [
        "#117b69", "#0f6b5a", "#18b89a", "#20c997", "#6f42c1", "#e83e8c", "#fd7e14", "#ffc107",
        "#28a745", "#17a2b8",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
