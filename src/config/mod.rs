// Configuration management module
// Handles TOML configuration persistence and endpoint resolution

pub mod interactive;
pub mod settings;

pub use interactive::{run_interactive_config, show_config};
pub use settings::{
    ApiConfig, ApiMode, ChatConfig, Config, ConfigError, EmbedConfig, Endpoint, IndexConfig,
};

/// Get the configuration directory path
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    Config::config_dir()
}
