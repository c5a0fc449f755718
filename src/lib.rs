use thiserror::Error;

pub type Result<T> = std::result::Result<T, AssistantError>;

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Index load failed: [{status}] {url}")]
    IndexLoad { status: u16, url: String },

    #[error("Index invalid: {0}")]
    IndexInvalid(String),

    #[error("Upstream error: HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AssistantError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<ureq::Error> for AssistantError {
    fn from(err: ureq::Error) -> Self {
        Self::Network(err.to_string())
    }
}

pub mod chat;
pub mod commands;
pub mod config;
pub mod embeddings;
pub mod index;
pub mod markdown;
pub mod prompt;
pub mod retrieval;
