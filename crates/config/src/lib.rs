//! Configuration loading, validation, and management for Ask PanDA.
//!
//! Loads configuration from `~/.askpanda/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.askpanda/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base system prompt, combined with the experiment's own prompt
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Language-model backend
    #[serde(default)]
    pub model: ModelConfig,

    /// Domain client routing table
    #[serde(default)]
    pub clients: ClientConfig,

    /// Active experiment
    #[serde(default)]
    pub experiment: ExperimentConfig,

    /// HTTP server
    #[serde(default)]
    pub server: ServerConfig,

    /// Conversation memory limits
    #[serde(default)]
    pub memory: MemoryConfig,
}

fn default_system_prompt() -> String {
    "You are a helpful assistant for PanDA workflows.".into()
}
fn default_true() -> bool {
    true
}

/// Which model backend to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelBackend {
    #[serde(rename = "openai")]
    OpenAi,
    Ollama,
}

impl ModelBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelBackend::OpenAi => "openai",
            ModelBackend::Ollama => "ollama",
        }
    }
}

impl std::str::FromStr for ModelBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(ModelBackend::OpenAi),
            "ollama" => Ok(ModelBackend::Ollama),
            other => Err(ConfigError::ValidationError(format!(
                "unknown model provider '{other}' (expected 'openai' or 'ollama')"
            ))),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_backend")]
    pub provider: ModelBackend,

    #[serde(default = "default_model_name")]
    pub model_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_backend() -> ModelBackend {
    ModelBackend::OpenAi
}
fn default_model_name() -> String {
    "gpt-4".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: default_backend(),
            model_name: default_model_name(),
            api_key: None,
            base_url: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("provider", &self.provider)
            .field("model_name", &self.model_name)
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// Routing table entries: one enabled flag per domain client plus the
/// connection parameters they share.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_true")]
    pub docs_enabled: bool,

    #[serde(default = "default_true")]
    pub logs_enabled: bool,

    #[serde(default = "default_true")]
    pub data_enabled: bool,

    #[serde(default = "default_true")]
    pub pilots_enabled: bool,

    #[serde(default = "default_true")]
    pub maintenance_enabled: bool,

    #[serde(default = "default_client_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

fn default_client_base_url() -> String {
    "http://bigpanda.cern.ch".into()
}
fn default_timeout() -> u64 {
    30
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            docs_enabled: true,
            logs_enabled: true,
            data_enabled: true,
            pilots_enabled: true,
            maintenance_enabled: true,
            base_url: default_client_base_url(),
            timeout: default_timeout(),
        }
    }
}

impl ClientConfig {
    /// Enabled flag for a client by name (`docs`, `logs`, ...). Unknown names are disabled.
    pub fn is_enabled(&self, client: &str) -> bool {
        match client {
            "docs" => self.docs_enabled,
            "logs" => self.logs_enabled,
            "data" => self.data_enabled,
            "pilots" => self.pilots_enabled,
            "maintenance" => self.maintenance_enabled,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    #[serde(default = "default_experiment_name")]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_settings: BTreeMap<String, serde_json::Value>,
}

fn default_experiment_name() -> String {
    "atlas".into()
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            name: default_experiment_name(),
            description: String::new(),
            custom_settings: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub debug: bool,

    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8000
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            debug: false,
            cors_origins: default_cors_origins(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Messages retained per conversation before the oldest is evicted
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,

    /// Advisory token budget; recorded but not enforced
    #[serde(default = "default_memory_max_tokens")]
    pub max_tokens: usize,
}

fn default_max_messages() -> usize {
    100
}
fn default_memory_max_tokens() -> usize {
    4000
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_messages: default_max_messages(),
            max_tokens: default_memory_max_tokens(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.askpanda/config.toml),
    /// then apply environment overrides.
    ///
    /// Recognised variables: `EXPERIMENT`, `MODEL_PROVIDER`, `MODEL_NAME`,
    /// `OPENAI_API_KEY` / `API_KEY`, `MODEL_BASE_URL`, `HOST`, `PORT`, `DEBUG`.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
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

    /// Apply environment overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup("EXPERIMENT") {
            self.experiment.name = name;
        }
        if let Some(provider) = lookup("MODEL_PROVIDER") {
            self.model.provider = provider.parse()?;
        }
        if let Some(model) = lookup("MODEL_NAME") {
            self.model.model_name = model;
        }
        if let Some(key) = lookup("OPENAI_API_KEY").or_else(|| lookup("API_KEY")) {
            self.model.api_key = Some(key);
        }
        if let Some(url) = lookup("MODEL_BASE_URL") {
            self.model.base_url = Some(url);
        }
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port.parse().map_err(|_| {
                ConfigError::ValidationError(format!("PORT must be a number between 1 and 65535, got '{port}'"))
            })?;
        }
        if let Some(debug) = lookup("DEBUG") {
            self.server.debug = debug.eq_ignore_ascii_case("true");
        }
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".askpanda")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(ConfigError::ValidationError(
                "model.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.model.max_tokens == 0 {
            return Err(ConfigError::ValidationError("model.max_tokens must be > 0".into()));
        }

        if self.clients.timeout == 0 {
            return Err(ConfigError::ValidationError("clients.timeout must be > 0".into()));
        }

        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server.port must be between 1 and 65535".into(),
            ));
        }

        if self.memory.max_messages == 0 {
            return Err(ConfigError::ValidationError("memory.max_messages must be >= 1".into()));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.model.api_key.is_some()
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
            system_prompt: default_system_prompt(),
            model: ModelConfig::default(),
            clients: ClientConfig::default(),
            experiment: ExperimentConfig::default(),
            server: ServerConfig::default(),
            memory: MemoryConfig::default(),
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
