//! Loads user settings from `settings.toml` in the platform config directory.
//!
//! A missing file means defaults. A file that exists but does not parse is
//! an error, so a typo in `base_url` is not silently ignored.
//!
//! ```toml
//! base_url = "http://localhost:5000"
//! layout = "sequential"
//! render_mode = "complete_only"
//!
//! [headers]
//! cookie = "session=..."
//! ```

use crate::app::RenderMode;
use crate::error::{Result, UploadError};
use crate::upload::{PollConfig, StageLayout};
use crate::utils::color::ColorExt;
use crate::utils::headers::build_header_map;
use eframe::egui::Color32;
use reqwest::header::HeaderMap;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE: &str = "settings.toml";
const APP_NAME: &str = "BreedUploader";
pub const URL_ENV_VAR: &str = "BREED_UPLOADER_URL";

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_ACCENT: Color32 = Color32::from_rgb(161, 89, 225);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
    pub max_file_size: u64,
    pub layout: StageLayout,
    pub render_mode: RenderMode,
    pub accent_color: String,
    pub headers: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        let poll = PollConfig::default();
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval_ms: poll.interval.as_millis() as u64,
            max_poll_attempts: poll.max_attempts,
            max_file_size: crate::upload::Validator::default().max_size(),
            layout: StageLayout::default(),
            render_mode: RenderMode::default(),
            accent_color: "#a159e1".to_string(),
            headers: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Parsed base URL, always ending in `/` so endpoints join under it.
    pub fn base_url(&self) -> Result<Url> {
        let mut raw = self.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let url = Url::parse(&raw)
            .map_err(|e| UploadError::Config(format!("base_url '{}': {}", self.base_url, e)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(UploadError::Config(format!(
                "base_url must be http or https, got '{}'",
                other
            ))),
        }
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            max_attempts: self.max_poll_attempts.max(1),
        }
    }

    pub fn header_map(&self) -> HeaderMap {
        build_header_map(
            self.headers
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str())),
        )
    }

    pub fn accent(&self) -> Color32 {
        Color32::from_hex(&self.accent_color).unwrap_or_else(|| {
            log::warn!("Invalid accent_color '{}', using default", self.accent_color);
            DEFAULT_ACCENT
        })
    }

    /// Resolves a possibly relative image URL against the server.
    pub fn resolve_url(&self, url: &str) -> String {
        match self.base_url().and_then(|base| {
            base.join(url)
                .map_err(|e| UploadError::Config(e.to_string()))
        }) {
            Ok(resolved) => resolved.to_string(),
            Err(_) => url.to_string(),
        }
    }

    pub fn apply_env_override(&mut self, value: Option<String>) {
        if let Some(url) = value.filter(|v| !v.trim().is_empty()) {
            log::info!("Using server URL from {}: {}", URL_ENV_VAR, url);
            self.base_url = url;
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut path| {
        path.push(APP_NAME);
        path.push(CONFIG_FILE);
        path
    })
}

pub fn load() -> Result<Config> {
    let mut config = match default_config_path() {
        Some(path) if path.exists() => load_from_path(&path)?,
        _ => Config::default(),
    };
    config.apply_env_override(std::env::var(URL_ENV_VAR).ok());
    Ok(config)
}

pub fn load_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|source| UploadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: Config = toml::from_str(&content)
        .map_err(|e| UploadError::Config(format!("{}: {}", path.display(), e)))?;
    log::info!("Loaded settings from {}", path.display());
    Ok(config)
}
