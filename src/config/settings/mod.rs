
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

pub const DEFAULT_AGGREGATED_BASE: &str = "https://ai-proxy.bhznjns.qzz.io";
pub const DEFAULT_CHAT_BASE: &str = "https://api.openai.com";
pub const DEFAULT_EMBED_BASE: &str = "https://api.openai.com";
pub const DEFAULT_CHAT_MODEL: &str = "deepseek-r1";
pub const DEFAULT_EMBED_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_INDEX_URL: &str = "http://localhost:4000/rag/index.json";
pub const DEFAULT_TOP_K: usize = 6;
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub chat: ChatConfig,
    pub embed: EmbedConfig,
    pub index: IndexConfig,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// Which credential set serves the OpenAI-compatible endpoints: one
/// aggregated gateway covering both capabilities, or separate per-capability
/// endpoints.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ApiMode {
    Aggregated,
    Direct,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub mode: ApiMode,
    pub base: String,
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChatConfig {
    pub base: String,
    pub key: String,
    pub model: String,
    /// Keyless relay that holds the credential server-side. When set it
    /// overrides both API modes for chat completions.
    pub proxy_url: Option<String>,
    pub stream: bool,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbedConfig {
    pub base: String,
    pub key: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndexConfig {
    pub url: String,
    pub top_k: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            chat: ChatConfig::default(),
            embed: EmbedConfig::default(),
            index: IndexConfig::default(),
            base_dir: PathBuf::new(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            mode: ApiMode::Aggregated,
            base: DEFAULT_AGGREGATED_BASE.to_string(),
            key: String::new(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base: DEFAULT_CHAT_BASE.to_string(),
            key: String::new(),
            model: DEFAULT_CHAT_MODEL.to_string(),
            proxy_url: None,
            stream: true,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
        }
    }
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            base: DEFAULT_EMBED_BASE.to_string(),
            key: String::new(),
            model: DEFAULT_EMBED_MODEL.to_string(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_INDEX_URL.to_string(),
            top_k: DEFAULT_TOP_K,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be created")]
    DirectoryError,
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
    #[error("Invalid model name: {0:?} (cannot be empty)")]
    InvalidModel(String),
    #[error("Invalid top-k: {0} (must be between 1 and 50)")]
    InvalidTopK(usize),
    #[error("Invalid temperature: {0} (must be between 0.0 and 2.0)")]
    InvalidTemperature(f32),
    #[error("No API key configured for the {0} endpoint; run `blog-chat config`")]
    MissingApiKey(&'static str),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// A fully resolved HTTP endpoint for one capability: where to POST, which
/// model to name in the body, and the bearer key if the endpoint needs one.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub url: Url,
    pub model: String,
    pub key: Option<String>,
}

impl Config {
    /// Platform configuration directory for this application
    #[inline]
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join("blog-chat"))
            .ok_or(ConfigError::DirectoryError)
    }

    /// Load configuration from the default directory, falling back to
    /// defaults when no config file exists yet
    #[inline]
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_dir()?)
    }

    #[inline]
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join("config.toml");

        if !config_path.exists() {
            return Ok(Self {
                base_dir: config_dir.as_ref().to_path_buf(),
                ..Self::default()
            });
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        config.base_dir = config_dir.as_ref().to_path_buf();

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    #[inline]
    pub fn save(&self) -> Result<()> {
        self.validate()
            .context("Configuration validation failed before saving")?;

        let config_dir = &self.base_dir;

        fs::create_dir_all(config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        let config_path = self.config_file_path();
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    #[inline]
    pub fn config_file_path(&self) -> PathBuf {
        self.base_dir.join("config.toml")
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_url(&self.api.base)?;
        parse_url(&self.chat.base)?;
        parse_url(&self.embed.base)?;
        parse_url(&self.index.url)?;
        if let Some(proxy) = &self.chat.proxy_url {
            parse_url(proxy)?;
        }

        if self.chat.model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.chat.model.clone()));
        }
        if self.embed.model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.embed.model.clone()));
        }

        if !(1..=50).contains(&self.index.top_k) {
            return Err(ConfigError::InvalidTopK(self.index.top_k));
        }

        if !(0.0..=2.0).contains(&self.chat.temperature) {
            return Err(ConfigError::InvalidTemperature(self.chat.temperature));
        }

        Ok(())
    }

    /// URL of the prebuilt embedding index document
    #[inline]
    pub fn index_url(&self) -> Result<Url, ConfigError> {
        parse_url(&self.index.url)
    }

    /// Resolve the embeddings endpoint for the active API mode.
    ///
    /// In direct mode a model of the form `<full-endpoint>::<model-name>`
    /// bypasses base-URL templating and is used verbatim.
    #[inline]
    pub fn embedding_endpoint(&self) -> Result<Endpoint, ConfigError> {
        match self.api.mode {
            ApiMode::Aggregated => {
                let key = require_key(&self.api.key, "aggregated")?;
                Ok(Endpoint {
                    url: join_url(&self.api.base, "/v1/embeddings")?,
                    model: self.embed.model.clone(),
                    key: Some(key),
                })
            }
            ApiMode::Direct => {
                let key = require_key(&self.embed.key, "embedding")?;
                if let Some((endpoint, model)) = self.embed.model.split_once("::") {
                    return Ok(Endpoint {
                        url: parse_url(endpoint)?,
                        model: model.to_string(),
                        key: Some(key),
                    });
                }
                Ok(Endpoint {
                    url: join_url(&self.embed.base, "/v1/embeddings")?,
                    model: self.embed.model.clone(),
                    key: Some(key),
                })
            }
        }
    }

    /// Resolve the chat-completions endpoint. A configured proxy URL wins
    /// over both API modes and needs no key.
    #[inline]
    pub fn chat_endpoint(&self) -> Result<Endpoint, ConfigError> {
        if let Some(proxy) = &self.chat.proxy_url {
            return Ok(Endpoint {
                url: parse_url(proxy)?,
                model: self.chat.model.clone(),
                key: None,
            });
        }

        match self.api.mode {
            ApiMode::Aggregated => {
                let key = require_key(&self.api.key, "aggregated")?;
                Ok(Endpoint {
                    url: join_url(&self.api.base, "/v1/chat/completions")?,
                    model: self.chat.model.clone(),
                    key: Some(key),
                })
            }
            ApiMode::Direct => {
                let key = require_key(&self.chat.key, "chat")?;
                Ok(Endpoint {
                    url: join_url(&self.chat.base, "/v1/chat/completions")?,
                    model: self.chat.model.clone(),
                    key: Some(key),
                })
            }
        }
    }
}

fn parse_url(value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|_| ConfigError::InvalidUrl(value.to_string()))
}

/// Resolve an absolute path against a base URL, keeping only the base origin
fn join_url(base: &str, path: &str) -> Result<Url, ConfigError> {
    parse_url(base)?
        .join(path)
        .map_err(|_| ConfigError::InvalidUrl(format!("{base}{path}")))
}

fn require_key(key: &str, endpoint: &'static str) -> Result<String, ConfigError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(ConfigError::MissingApiKey(endpoint));
    }
    Ok(key.to_string())
}
