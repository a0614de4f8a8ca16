//! Feed configuration loaded from TOML.
//!
//! ```toml
//! [feed]
//! username = "jack"
//! count = 10
//! auto_refresh = true
//! refresh_interval_ms = 30000
//! tooltips = true
//! ```

use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_ENDPOINT: &str = "http://search.twitter.com/search.json";
pub const DEFAULT_PROFILE_ENDPOINT: &str = "http://api.twitter.com/1/users/show.json";
pub const MIN_REFRESH_INTERVAL_MS: u64 = 1_000;
pub const DEFAULT_MAX_POSTS: usize = 50;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub feed: FeedConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub username: String,
    pub count: usize,
    pub auto_refresh: bool,
    pub refresh_interval_ms: u64,
    /// Upper bound on posts kept across refreshes. Never below `count`.
    pub max_posts: usize,
    pub tooltips: bool,
    pub follow_button: bool,
    pub endpoint: String,
    pub profile_endpoint: String,
    pub site_url: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            count: 5,
            auto_refresh: false,
            refresh_interval_ms: 60_000,
            max_posts: DEFAULT_MAX_POSTS,
            tooltips: true,
            follow_button: false,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            profile_endpoint: DEFAULT_PROFILE_ENDPOINT.to_string(),
            site_url: crate::render::DEFAULT_SITE_URL.to_string(),
        }
    }
}

impl FeedConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.username.trim().is_empty() {
            return Err(ConfigError::Invalid("username is required".to_string()));
        }
        if self.count == 0 {
            return Err(ConfigError::Invalid("count must be at least 1".to_string()));
        }
        if self.max_posts == 0 {
            return Err(ConfigError::Invalid("max_posts must be at least 1".to_string()));
        }
        if self.auto_refresh && self.refresh_interval_ms < MIN_REFRESH_INTERVAL_MS {
            return Err(ConfigError::Invalid(format!(
                "refresh_interval_ms must be at least {} when auto_refresh is on",
                MIN_REFRESH_INTERVAL_MS
            )));
        }
        Ok(())
    }

    pub fn render_options(&self) -> crate::render::RenderOptions {
        crate::render::RenderOptions::new(&self.site_url)
    }
}

/// `<config_dir>/postfeed/config.toml`, if a config dir exists on this platform.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("postfeed").join("config.toml"))
}

pub fn load_from(path: &Path) -> Result<FeedConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let file: ConfigFile = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(file.feed)
}

/// Load the explicit path if given, else the default path if it exists,
/// else built-in defaults.
pub fn load(explicit: Option<&Path>) -> Result<FeedConfig, ConfigError> {
    if let Some(path) = explicit {
        return load_from(path);
    }
    match default_config_path() {
        Some(path) if path.exists() => load_from(&path),
        _ => Ok(FeedConfig::default()),
    }
}
