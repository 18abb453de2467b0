//! Configuration management for baton
//!
//! Loads runner limits, model endpoint credentials and the demo profile from
//! a JSON file, with environment variables as a fallback for API keys.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod paths;

pub use paths::{config_path, data_dir};

/// Environment variables consulted for API keys, in priority order
pub const API_KEY_ENV_VARS: &[&str] = &["GEMINI_API_KEY", "OPENAI_API_KEY", "OPENROUTER_API_KEY"];

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("◆ CONFIG IO ERROR: {0}")]
    Io(#[from] std::io::Error),

    #[error("◆ CONFIG PARSE ERROR: {0}")]
    Json(#[from] serde_json::Error),

    #[error("◆ CONFIG NOT FOUND: {0}")]
    NotFound(PathBuf),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Credentials for one model endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

/// All supported model endpoints
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderSet {
    #[serde(default)]
    pub gemini: ProviderConfig,
    #[serde(default)]
    pub openai: ProviderConfig,
    #[serde(default)]
    pub openrouter: ProviderConfig,
}

/// Runner defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerDefaults {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Ceiling on model rounds per turn; 0 disables the guard
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,
}

impl Default for RunnerDefaults {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            max_turns: default_max_turns(),
        }
    }
}

/// Empty leaves the choice to the endpoint's default
fn default_model() -> String {
    String::new()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_turns() -> u32 {
    20
}

/// Profile of the human using the shopping demo
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    #[serde(default = "default_profile_id")]
    pub id: String,
    #[serde(default = "default_profile_name")]
    pub name: String,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            id: default_profile_id(),
            name: default_profile_name(),
        }
    }
}

fn default_profile_id() -> String {
    "123".to_string()
}

fn default_profile_name() -> String {
    "Alex".to_string()
}

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub runner: RunnerDefaults,
    #[serde(default)]
    pub providers: ProviderSet,
    #[serde(default)]
    pub profile: ProfileConfig,
}

impl Config {
    /// Load from the default location
    pub async fn load() -> Result<Self> {
        let path = config_path();
        Self::load_from(&path).await
    }

    /// Load from a specific location, falling back to defaults when absent
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("◆ NO CONFIG AT {:?}, USING DEFAULTS", path);
            return Ok(Config::default());
        }

        debug!("◆ LOADING CONFIG FROM {:?}", path);
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Load from a location that must exist
    pub async fn load_existing(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        Self::load_from(path).await
    }

    /// Save to the default location
    pub async fn save(&self) -> Result<()> {
        let path = config_path();
        self.save_to(&path).await
    }

    /// Save to a specific location
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        debug!("◆ WRITING CONFIG TO {:?}", path);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// API key from the config file, else from the environment
    pub fn api_key(&self) -> Option<String> {
        self.api_key_with(|name| std::env::var(name).ok())
    }

    /// API key resolution with an injectable environment lookup
    pub fn api_key_with<F>(&self, env: F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let configured = [
            &self.providers.gemini,
            &self.providers.openai,
            &self.providers.openrouter,
        ];
        if let Some(p) = configured.iter().find(|p| !p.api_key.is_empty()) {
            return Some(p.api_key.clone());
        }

        API_KEY_ENV_VARS
            .iter()
            .filter_map(|name| env(name))
            .find(|key| !key.is_empty())
    }

    /// Explicit base URL of the endpoint whose key is in use
    ///
    /// `None` lets the provider pick a base URL from the key's flavour.
    pub fn api_base(&self) -> Option<String> {
        let configured = [
            &self.providers.gemini,
            &self.providers.openai,
            &self.providers.openrouter,
        ];
        configured
            .iter()
            .find(|p| !p.api_key.is_empty())
            .and_then(|p| p.api_base.clone())
            .filter(|b| !b.is_empty())
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key().is_some()
    }

    /// Configured model name; `None` when the endpoint should pick
    pub fn model(&self) -> Option<String> {
        Some(self.runner.model.clone()).filter(|m| !m.is_empty())
    }

    /// Per-turn ceiling on model rounds; `None` when disabled
    pub fn max_turns(&self) -> Option<u32> {
        match self.runner.max_turns {
            0 => None,
            n => Some(n),
        }
    }
}

/// Write a default config unless one already exists, then load it
pub async fn init() -> Result<Config> {
    let config_path = config_path();

    if config_path.exists() {
        warn!("◆ CONFIG ALREADY EXISTS AT {:?}", config_path);
    } else {
        let config = Config::default();
        config.save().await?;
        info!("◆ CONFIG WRITTEN TO {:?}", config_path);
    }

    Config::load().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_turns_zero_disables_guard() {
        let mut config = Config::default();
        assert_eq!(config.max_turns(), Some(20));
        config.runner.max_turns = 0;
        assert_eq!(config.max_turns(), None);
    }

    #[test]
    fn test_api_base_follows_key() {
        let mut config = Config::default();
        config.providers.openrouter.api_base = Some("https://example.test/v1".to_string());
        assert_eq!(config.api_base(), None);

        config.providers.openrouter.api_key = "sk-or-1".to_string();
        assert_eq!(config.api_base(), Some("https://example.test/v1".to_string()));
    }
}
