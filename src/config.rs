use crate::error::Result;
use crate::theme::Theme;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory the `.drawio` artifacts are written to and served from.
    pub dir: PathBuf,
    /// Public base URL of the file endpoint. Edit links are only produced when set.
    pub external_url: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("wwwroot"),
            external_url: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CleanupConfig {
    pub interval_minutes: u64,
    pub max_age_minutes: u64,
    pub initial_delay_seconds: u64,
}

impl CleanupConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }

    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_minutes * 60)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_seconds)
    }
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 15,
            max_age_minutes: 30,
            initial_delay_seconds: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Use the calibrated per-character width table instead of loading system fonts.
    pub fast_text_metrics: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            fast_text_metrics: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub theme: Theme,
    pub storage: StorageConfig,
    pub cleanup: CleanupConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<Theme>,
    storage: Option<StorageConfigFile>,
    cleanup: Option<CleanupConfigFile>,
    render: Option<RenderConfigFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StorageConfigFile {
    dir: Option<PathBuf>,
    #[serde(alias = "external_url")]
    external_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CleanupConfigFile {
    #[serde(alias = "interval_minutes")]
    interval_minutes: Option<u64>,
    #[serde(alias = "max_age_minutes")]
    max_age_minutes: Option<u64>,
    #[serde(alias = "initial_delay_seconds")]
    initial_delay_seconds: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    #[serde(alias = "fast_text_metrics")]
    fast_text_metrics: Option<bool>,
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = serde_json::from_str(contents)?;

    if let Some(theme) = parsed.theme {
        config.theme = theme;
    }
    if let Some(storage) = parsed.storage {
        if let Some(v) = storage.dir {
            config.storage.dir = v;
        }
        config.storage.external_url = normalize_url(storage.external_url);
    }
    if let Some(cleanup) = parsed.cleanup {
        if let Some(v) = cleanup.interval_minutes {
            config.cleanup.interval_minutes = v.max(1);
        }
        if let Some(v) = cleanup.max_age_minutes {
            config.cleanup.max_age_minutes = v;
        }
        if let Some(v) = cleanup.initial_delay_seconds {
            config.cleanup.initial_delay_seconds = v;
        }
    }
    if let Some(render) = parsed.render
        && let Some(v) = render.fast_text_metrics
    {
        config.render.fast_text_metrics = v;
    }

    Ok(config)
}

/// Empty strings count as "not configured"; a trailing slash is dropped so
/// links can be joined with `/api/...`.
pub fn normalize_url(url: Option<String>) -> Option<String> {
    let url = url?;
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
