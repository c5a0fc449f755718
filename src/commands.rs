use anyhow::{Context, Result};
use console::style;
use dialoguer::Input;
use indicatif::ProgressBar;
use itertools::Itertools;
use std::io::Write;
use std::time::Duration;
use tracing::info;

use crate::chat::session::{ChatSession, Citation};
use crate::config::Config;
use crate::index::IndexLoader;
use crate::markdown;

const SPINNER_TICK_MILLIS: u64 = 100;

/// Ask a single question and print the answer
#[inline]
pub fn ask(question: &str, html: bool, no_stream: bool) -> Result<()> {
    let mut config = Config::load().context("Failed to load configuration")?;
    if no_stream || html {
        // rendering needs the whole answer, so --html implies buffering
        config.chat.stream = false;
    }

    let mut session = ChatSession::new(config)?;

    let mut streamed = false;
    let mut on_chunk = |chunk: &str| {
        streamed = true;
        print!("{chunk}");
        let _ = std::io::stdout().flush();
    };

    let outcome = session.send(question, Some(&mut on_chunk))?;
    let Some(outcome) = outcome else {
        return Ok(());
    };

    if streamed {
        println!();
    } else if html {
        println!("{}", markdown::render(&outcome.answer));
    } else {
        println!("{}", outcome.answer);
    }

    print_citations(&outcome.citations);
    Ok(())
}

/// Interactive conversation loop. `clear` resets history, `exit` quits.
#[inline]
pub fn chat() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let mut session = ChatSession::new(config)?;

    eprintln!("{}", style("💬 Blog chat").bold().cyan());
    eprintln!(
        "{}",
        style("Answers come from this blog's articles. Type `clear` to reset history, `exit` to quit.")
            .dim()
    );
    eprintln!();

    loop {
        let line: String = Input::new()
            .with_prompt("you")
            .allow_empty(true)
            .interact_text()?;
        let question = line.trim();

        if question.is_empty() {
            continue;
        }
        match question {
            "exit" | "quit" => break,
            "clear" => {
                session.clear();
                eprintln!("{}", style("(history cleared)").dim());
                continue;
            }
            _ => {}
        }

        let spinner = ProgressBar::new_spinner();
        spinner.set_message("thinking...");
        spinner.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MILLIS));

        let mut streamed = false;
        let result = {
            let mut on_chunk = |chunk: &str| {
                if !streamed {
                    spinner.finish_and_clear();
                    streamed = true;
                }
                print!("{chunk}");
                let _ = std::io::stdout().flush();
            };
            session.send(question, Some(&mut on_chunk))
        };
        spinner.finish_and_clear();

        match result {
            Ok(Some(outcome)) => {
                if streamed {
                    println!();
                } else {
                    println!("{}", outcome.answer);
                }
                print_citations(&outcome.citations);
                println!();
            }
            Ok(None) => {}
            // errors stay scoped to this question; the loop keeps going
            Err(e) => eprintln!("{}", style(format!("error: {e}")).red()),
        }
    }

    info!("Chat session ended with {} messages", session.history().len());
    Ok(())
}

/// Show configuration and index health
#[inline]
pub fn status() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let url = config.index_url()?;

    println!("Embedding index: {url}");

    let mut loader = IndexLoader::new(url);
    match loader.ensure() {
        Ok(index) => {
            println!("  Entries: {}", index.items.len());
            println!("  Documents: {}", index.distinct_documents());
            println!("  Dimensions: {}", index.dim);
        }
        Err(e) => {
            println!("  {} {e}", style("Unavailable:").red());
        }
    }

    println!();
    println!("Chat model: {}", config.chat.model);
    println!("Embedding model: {}", config.embed.model);
    println!(
        "Streaming: {}",
        if config.chat.stream { "on" } else { "off" }
    );
    println!("Context chunks per question: {}", config.index.top_k);

    Ok(())
}

fn print_citations(citations: &[Citation]) {
    if citations.is_empty() {
        return;
    }

    let line = citations
        .iter()
        .enumerate()
        .map(|(i, citation)| format!("[{}] {} — {}", i + 1, citation.title, citation.url))
        .join("  ");
    println!("{}", style(line).dim());
}
