//! Configuration loading, validation, and management for stylecraft.
//!
//! Loads configuration from `~/.stylecraft/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.stylecraft/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Style adaptation stage settings
    #[serde(default)]
    pub adaptation: AdaptationConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "openrouter".into()
}
fn default_model() -> String {
    "openai/gpt-4o".into()
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("adaptation", &self.adaptation)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

/// Settings for the style adaptation stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptationConfig {
    /// Model for the adaptation call. Falls back to `default_model`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Sampling temperature. Kept moderate so the source style wins over variety.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Response-size ceiling for the adaptation call
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Context window of the adaptation model
    #[serde(default = "default_context_window")]
    pub context_window_tokens: usize,

    /// Fraction of the context window a prompt pair may fill
    #[serde(default = "default_budget_utilization")]
    pub budget_utilization: f64,

    /// Models known to mishandle structured-output tool calling.
    /// These get raw text back and go through the manual extractor.
    #[serde(default = "default_manual_parsing_models")]
    pub manual_parsing_models: Vec<String>,

    /// Restore drifted style fields from the recipe after adaptation
    #[serde(default)]
    pub enforce_style_preservation: bool,

    /// Language used when a run does not set one
    #[serde(default = "default_language")]
    pub default_language: String,
}

fn default_temperature() -> f32 {
    0.5
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_context_window() -> usize {
    128_000
}
fn default_budget_utilization() -> f64 {
    0.85
}
fn default_manual_parsing_models() -> Vec<String> {
    vec![
        "deepseek/deepseek-chat".into(),
        "deepseek/deepseek-r1".into(),
        "qwen/qwen3-235b-a22b".into(),
        "google/gemini-2.5-flash".into(),
    ]
}
fn default_language() -> String {
    "en".into()
}

impl Default for AdaptationConfig {
    fn default() -> Self {
        Self {
            model: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            context_window_tokens: default_context_window(),
            budget_utilization: default_budget_utilization(),
            manual_parsing_models: default_manual_parsing_models(),
            enforce_style_preservation: false,
            default_language: default_language(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.stylecraft/config.toml).
    ///
    /// Also checks environment variables for API keys:
    /// - `STYLECRAFT_API_KEY` (highest priority)
    /// - `OPENROUTER_API_KEY`
    /// - `OPENAI_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();
        let mut config = Self::load_from(&config_path)?;

        // Environment variable overrides (highest priority)
        if config.api_key.is_none() {
            config.api_key = std::env::var("STYLECRAFT_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENROUTER_API_KEY").ok())
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(provider) = std::env::var("STYLECRAFT_PROVIDER") {
            config.default_provider = provider;
        }

        if let Ok(model) = std::env::var("STYLECRAFT_MODEL") {
            config.default_model = model;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".stylecraft")
    }

    /// Get the configuration file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let adaptation = &self.adaptation;
        if adaptation.temperature < 0.0 || adaptation.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "adaptation.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if adaptation.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "adaptation.max_tokens must be > 0".into(),
            ));
        }

        if adaptation.context_window_tokens <= adaptation.max_tokens as usize {
            return Err(ConfigError::ValidationError(
                "adaptation.context_window_tokens must exceed adaptation.max_tokens".into(),
            ));
        }

        if adaptation.budget_utilization <= 0.0 || adaptation.budget_utilization > 1.0 {
            return Err(ConfigError::ValidationError(
                "adaptation.budget_utilization must be in (0.0, 1.0]".into(),
            ));
        }

        Ok(())
    }

    /// The model used for the adaptation call.
    pub fn adaptation_model(&self) -> &str {
        self.adaptation
            .model
            .as_deref()
            .unwrap_or(&self.default_model)
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some() || self.providers.values().any(|p| p.api_key.is_some())
    }

    /// Generate a default config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            adaptation: AdaptationConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
