// src/infra/config.rs — Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::infra::paths;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub roles: RolesConfig,

    #[serde(default)]
    pub exploration: ExplorationSettings,

    #[serde(default)]
    pub retry: RetrySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub provider: String,
    pub model: Option<String>,
    /// Custom OpenAI-compatible endpoint. Overrides the provider's default.
    pub base_url: Option<String>,
    /// Environment variable holding the API key. Overrides the provider's default.
    pub api_key_env: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: "groq".into(),
            model: None,
            base_url: None,
            api_key_env: None,
            temperature: None,
            max_tokens: Some(4096),
        }
    }
}

/// Optional per-step model ids. Unset roles use the default model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RolesConfig {
    pub generator: Option<String>,
    pub evaluator: Option<String>,
    pub refiner: Option<String>,
    pub selector: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorationSettings {
    pub candidate_count: u32,
    pub top_k: u32,
    pub max_iterations: u32,
}

impl Default for ExplorationSettings {
    fn default() -> Self {
        Self {
            candidate_count: 5,
            top_k: 3,
            max_iterations: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1_000,
            max_delay_ms: 15_000,
        }
    }
}

impl Config {
    /// Load config from file, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = paths::config_file_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
