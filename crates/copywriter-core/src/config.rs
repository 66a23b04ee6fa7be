use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

use crate::ai::{DEFAULT_MAX_TOKENS, DEFAULT_TIMEOUT_SECS};
use crate::provider::Provider;

pub const DEFAULT_LOG_FILE: &str = "generated_copy.txt";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub deepseek_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub max_tokens: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub log_path: Option<PathBuf>,
    /// Overrides the provider's endpoint, e.g. for a proxy or a self-hosted gateway.
    pub base_url: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            provider: Some(Provider::DeepSeek.as_str().to_string()),
            ..Default::default()
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| anyhow!("Invalid config file {:?}: {}", config_path, e))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content)?;
        Ok(())
    }

    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("copywriter"))
    }

    pub fn get_config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Configured provider, falling back to DeepSeek for missing or unknown names.
    pub fn provider(&self) -> Provider {
        self.provider
            .as_deref()
            .and_then(Provider::from_str)
            .unwrap_or(Provider::DeepSeek)
    }

    pub fn model(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| self.provider().default_model().to_string())
    }

    pub fn base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| self.provider().base_url().to_string())
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE))
    }

    fn stored_key(&self, provider: Provider) -> Option<&String> {
        match provider {
            Provider::DeepSeek => self.deepseek_api_key.as_ref(),
            Provider::OpenAI => self.openai_api_key.as_ref(),
        }
    }

    pub fn set_api_key(&mut self, provider: Provider, key: &str) {
        let key = Some(key.trim().to_string());
        match provider {
            Provider::DeepSeek => self.deepseek_api_key = key,
            Provider::OpenAI => self.openai_api_key = key,
        }
    }

    /// API key for `provider`: environment variable first, then the config file.
    pub fn api_key(&self, provider: Provider) -> Option<String> {
        resolve_key(
            std::env::var(provider.api_key_env()).ok(),
            self.stored_key(provider).cloned(),
        )
    }

    /// Returns where the key for a provider comes from: "env", "config", or None
    pub fn api_key_source(&self, provider: Provider) -> Option<&'static str> {
        let from_env = std::env::var(provider.api_key_env()).ok();
        if resolve_key(from_env, None).is_some() {
            Some("env")
        } else if resolve_key(None, self.stored_key(provider).cloned()).is_some() {
            Some("config")
        } else {
            None
        }
    }
}

fn resolve_key(from_env: Option<String>, from_config: Option<String>) -> Option<String> {
    [from_env, from_config]
        .into_iter()
        .flatten()
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty())
}
