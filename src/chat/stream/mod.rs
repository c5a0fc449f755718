//! Incremental consumption of SSE-style chat completion streams.

#[cfg(test)]
mod tests;

use serde::Deserialize;
use std::io::BufRead;
use tracing::debug;

use crate::Result;

const DATA_PREFIX: &str = "data:";
const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Deserialize)]
struct StreamFrame {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: Option<StreamContent>,
    message: Option<StreamContent>,
}

#[derive(Debug, Deserialize)]
struct StreamContent {
    content: Option<String>,
}

/// Accumulate the assistant text from a newline-delimited `data:` stream.
///
/// Only `data:`-prefixed lines are considered; the `[DONE]` sentinel ends
/// consumption immediately even if more input remains buffered. Frames that
/// fail to parse are skipped: some providers interleave keep-alive lines
/// that are not JSON, and the stream is not treated as a strict protocol.
pub(crate) fn consume<R: BufRead>(reader: R, on_chunk: &mut dyn FnMut(&str)) -> Result<String> {
    let mut answer = String::new();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();

        let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
            continue;
        };
        let payload = payload.trim();

        if payload == DONE_SENTINEL {
            break;
        }

        let frame: StreamFrame = match serde_json::from_str(payload) {
            Ok(frame) => frame,
            Err(e) => {
                debug!("Skipping unparseable stream frame: {e}");
                continue;
            }
        };

        let delta = frame.choices.into_iter().next().and_then(|choice| {
            choice
                .delta
                .and_then(|d| d.content)
                .or_else(|| choice.message.and_then(|m| m.content))
        });

        if let Some(delta) = delta.filter(|d| !d.is_empty()) {
            answer.push_str(&delta);
            on_chunk(&delta);
        }
    }

    Ok(answer)
}
