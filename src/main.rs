use anyhow::Result;
use blog_chat::commands::{ask, chat, status};
use blog_chat::config::{run_interactive_config, show_config};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "blog-chat")]
#[command(about = "Ask questions against a static blog's prebuilt embedding index")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure API endpoints, keys, and models
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Ask a single question and print the answer
    Ask {
        /// The question to answer from the blog's content
        question: String,
        /// Print the answer as rendered HTML instead of Markdown
        #[arg(long)]
        html: bool,
        /// Wait for the complete answer instead of streaming it
        #[arg(long)]
        no_stream: bool,
    },
    /// Start an interactive chat session
    Chat,
    /// Show configuration and index health
    Status,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Ask {
            question,
            html,
            no_stream,
        } => {
            ask(&question, html, no_stream)?;
        }
        Commands::Chat => {
            chat()?;
        }
        Commands::Status => {
            status()?;
        }
    }

    Ok(())
}
