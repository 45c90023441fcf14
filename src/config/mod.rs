//! Configuration management for slka
//!
//! One TOML file under the platform config dir holds the tokens and the API
//! settings. Environment variables override tokens and the API URL after the
//! file is read; approval gating can only be changed in the file itself.

mod token;

pub use token::{mask_token, TokenKind};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_READ_TOKEN: &str = "SLKA_READ_TOKEN";
pub const ENV_WRITE_TOKEN: &str = "SLKA_WRITE_TOKEN";
pub const ENV_USER_TOKEN: &str = "SLKA_USER_TOKEN";
pub const ENV_API_URL: &str = "SLKA_API_URL";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub read_token: String,
    pub write_token: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub user_token: String,
    /// Prompt before every write
    pub require_approval: bool,
    pub api: ApiConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            read_token: String::new(),
            write_token: String::new(),
            user_token: String::new(),
            require_approval: true,
            api: ApiConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Retries after the first attempt for rate limits and transient failures
    pub max_retries: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://slack.com/api".to_string(),
            timeout_secs: 30,
            max_retries: 2,
        }
    }
}

/// Which credential a command needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Read,
    Write,
}

impl Config {
    /// Load from `path` (or the default location), then apply env overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_path()?,
        };
        let mut config = Self::load_file(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// File contents only; a missing file yields the defaults
    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Apply environment-style overrides from `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(token) = non_empty(ENV_READ_TOKEN) {
            self.read_token = token;
        }
        if let Some(token) = non_empty(ENV_WRITE_TOKEN) {
            self.write_token = token;
        }
        if let Some(token) = non_empty(ENV_USER_TOKEN) {
            self.user_token = token;
        }
        if let Some(url) = non_empty(ENV_API_URL) {
            self.api.base_url = url;
        }
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "slka") {
            Ok(proj_dirs.config_dir().join("config.toml"))
        } else {
            Ok(PathBuf::from("config.toml"))
        }
    }

    /// Write to `path`, readable by the owner only
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    /// Both tokens are required for a usable setup
    pub fn validate(&self) -> Result<()> {
        if self.read_token.trim().is_empty() {
            bail!("read_token is required");
        }
        if self.write_token.trim().is_empty() {
            bail!("write_token is required");
        }
        Ok(())
    }

    /// Token for `surface`, if configured
    pub fn token_for(&self, surface: Surface) -> Option<&str> {
        let token = match surface {
            Surface::Read => &self.read_token,
            Surface::Write => &self.write_token,
        };
        Some(token.as_str()).filter(|t| !t.trim().is_empty())
    }

    /// Set a single key by its dotted name
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "read_token" => self.read_token = value.to_string(),
            "write_token" => self.write_token = value.to_string(),
            "user_token" => self.user_token = value.to_string(),
            "require_approval" => {
                self.require_approval = parse_bool(value).with_context(|| {
                    format!("require_approval expects true/false, got '{}'", value)
                })?
            }
            "api.base_url" => {
                let url = url::Url::parse(value)
                    .with_context(|| format!("api.base_url expects a URL, got '{}'", value))?;
                if !matches!(url.scheme(), "http" | "https") {
                    bail!("api.base_url must be http or https, got '{}'", url.scheme());
                }
                self.api.base_url = value.trim_end_matches('/').to_string();
            }
            "api.timeout_secs" => {
                self.api.timeout_secs = value
                    .parse()
                    .with_context(|| format!("api.timeout_secs expects seconds, got '{}'", value))?
            }
            "api.max_retries" => {
                self.api.max_retries = value
                    .parse()
                    .with_context(|| format!("api.max_retries expects a count, got '{}'", value))?
            }
            other => bail!(
                "Unknown config key '{}'. Valid keys: read_token, write_token, user_token, \
                 require_approval, api.base_url, api.timeout_secs, api.max_retries",
                other
            ),
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}
