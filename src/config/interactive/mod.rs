use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};

use super::{ApiMode, Config, ConfigError};

#[inline]
pub fn run_interactive_config() -> Result<()> {
    eprintln!("{}", style("🔧 Blog Chat Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config()?;

    eprintln!("{}", style("API Configuration").bold().yellow());
    eprintln!("Configure the OpenAI-compatible endpoints used for embeddings and chat.");
    eprintln!();

    configure_api(&mut config)?;

    eprintln!();
    eprintln!("{}", style("Testing index availability...").yellow());

    if test_index_connection(&config)? {
        eprintln!("{}", style("✓ Embedding index is reachable!").green());
    } else {
        eprintln!(
            "{}",
            style("⚠ Warning: Could not reach the embedding index").yellow()
        );
        eprintln!("You can continue, but make sure the blog is serving /rag/index.json.");
    }

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());

        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("API Settings:").bold().yellow());
    let mode = match config.api.mode {
        ApiMode::Aggregated => "aggregated",
        ApiMode::Direct => "direct",
    };
    eprintln!("  Mode: {}", style(mode).cyan());
    eprintln!("  Aggregated base: {}", style(&config.api.base).cyan());
    eprintln!("  Aggregated key: {}", style(key_status(&config.api.key)).cyan());

    eprintln!();
    eprintln!("{}", style("Chat Settings:").bold().yellow());
    eprintln!("  Base: {}", style(&config.chat.base).cyan());
    eprintln!("  Key: {}", style(key_status(&config.chat.key)).cyan());
    eprintln!("  Model: {}", style(&config.chat.model).cyan());
    if let Some(proxy) = &config.chat.proxy_url {
        eprintln!("  Proxy: {}", style(proxy).cyan());
    }
    eprintln!("  Streaming: {}", style(config.chat.stream).cyan());
    eprintln!("  Temperature: {}", style(config.chat.temperature).cyan());
    if let Some(max_tokens) = config.chat.max_tokens {
        eprintln!("  Max tokens: {}", style(max_tokens).cyan());
    }

    eprintln!();
    eprintln!("{}", style("Embedding Settings:").bold().yellow());
    eprintln!("  Base: {}", style(&config.embed.base).cyan());
    eprintln!("  Key: {}", style(key_status(&config.embed.key)).cyan());
    eprintln!("  Model: {}", style(&config.embed.model).cyan());

    eprintln!();
    eprintln!("{}", style("Index Settings:").bold().yellow());
    eprintln!("  URL: {}", style(&config.index.url).cyan());
    eprintln!("  Top-k: {}", style(config.index.top_k).cyan());

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

fn key_status(key: &str) -> &'static str {
    if key.trim().is_empty() {
        "(not set)"
    } else {
        "(set)"
    }
}

fn load_existing_config() -> Result<Config> {
    Config::load().map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No existing configuration found. Using defaults.").yellow()
            );
            let mut config = Config::default();
            config.base_dir = Config::config_dir()?;
            Ok(config)
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            Ok(config)
        },
    )
}

fn configure_api(config: &mut Config) -> Result<()> {
    let modes = &["aggregated (one gateway for embeddings and chat)", "direct (separate endpoints)"];
    let default_index = match config.api.mode {
        ApiMode::Aggregated => 0,
        ApiMode::Direct => 1,
    };

    let mode_index = Select::new()
        .with_prompt("API mode")
        .default(default_index)
        .items(modes)
        .interact()?;
    config.api.mode = if mode_index == 0 {
        ApiMode::Aggregated
    } else {
        ApiMode::Direct
    };

    match config.api.mode {
        ApiMode::Aggregated => {
            config.api.base = prompt_url("Aggregated API base", &config.api.base)?;
            config.api.key = prompt_key("Aggregated API key", &config.api.key)?;
        }
        ApiMode::Direct => {
            config.chat.base = prompt_url("Chat API base", &config.chat.base)?;
            config.chat.key = prompt_key("Chat API key", &config.chat.key)?;
            config.embed.base = prompt_url("Embedding API base", &config.embed.base)?;
            config.embed.key = prompt_key("Embedding API key", &config.embed.key)?;
        }
    }

    config.chat.model = Input::new()
        .with_prompt("Chat model")
        .default(config.chat.model.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Model name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    config.embed.model = Input::new()
        .with_prompt("Embedding model (or <endpoint>::<model>)")
        .default(config.embed.model.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Model name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    config.chat.stream = Confirm::new()
        .with_prompt("Stream responses?")
        .default(config.chat.stream)
        .interact()?;

    config.index.url = prompt_url("Embedding index URL", &config.index.url)?;

    config.index.top_k = Input::new()
        .with_prompt("Context chunks per question (top-k)")
        .default(config.index.top_k)
        .validate_with(|input: &usize| -> Result<(), ConfigError> {
            if (1..=50).contains(input) {
                Ok(())
            } else {
                Err(ConfigError::InvalidTopK(*input))
            }
        })
        .interact_text()?;

    Ok(())
}

fn prompt_url(prompt: &str, current: &str) -> Result<String> {
    let value: String = Input::new()
        .with_prompt(prompt)
        .default(current.to_string())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            url::Url::parse(input)
                .map(|_| ())
                .map_err(|_| ConfigError::InvalidUrl(input.clone()))
        })
        .interact_text()?;
    Ok(value.trim().to_string())
}

fn prompt_key(prompt: &str, current: &str) -> Result<String> {
    let value: String = Input::new()
        .with_prompt(format!("{prompt} (empty to keep unset)"))
        .default(current.to_string())
        .allow_empty(true)
        .interact_text()?;
    Ok(value.trim().to_string())
}

fn test_index_connection(config: &Config) -> Result<bool> {
    let Ok(url) = config.index_url() else {
        return Ok(false);
    };

    let agent: ureq::Agent = ureq::Agent::config_builder()
        .timeout_global(Some(std::time::Duration::from_secs(5)))
        .build()
        .into();

    match agent.get(url.as_str()).call() {
        Ok(_) => Ok(true),
        Err(ureq::Error::StatusCode(code)) if (400..500).contains(&code) => Ok(true),
        Err(_) => Ok(false),
    }
}
