use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable consulted before the config file.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    pub api_key: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Env var wins over the config file. Blank values count as absent.
    pub fn resolve_api_key(&self) -> Option<String> {
        let env_value = std::env::var(API_KEY_ENV).ok();
        resolve_api_key_from(env_value, self.api_key.clone())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("prompt-console").join("config.json"))
    }
}

fn resolve_api_key_from(env_value: Option<String>, file_value: Option<String>) -> Option<String> {
    env_value
        .filter(|key| !key.trim().is_empty())
        .or_else(|| file_value.filter(|key| !key.trim().is_empty()))
}
