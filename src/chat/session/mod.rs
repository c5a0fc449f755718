
use tracing::{debug, info};

use crate::chat::{ChatClient, ChatMessage};
use crate::config::Config;
use crate::embeddings::EmbeddingClient;
use crate::index::IndexLoader;
use crate::prompt::build_prompt;
use crate::retrieval::pick_top_k;
use crate::Result;

/// A source document backing part of an answer, in rank order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Citation {
    pub title: String,
    pub url: String,
}

/// The result of one completed question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatOutcome {
    pub answer: String,
    pub citations: Vec<Citation>,
}

/// Per-session pipeline state: the loaded index, the conversation history,
/// and the in-flight guard. Owned by whoever drives the conversation; there
/// are no ambient singletons.
#[derive(Debug)]
pub struct ChatSession {
    config: Config,
    loader: IndexLoader,
    history: Vec<ChatMessage>,
    busy: bool,
}

impl ChatSession {
    #[inline]
    pub fn new(config: Config) -> Result<Self> {
        let loader = IndexLoader::new(config.index_url()?);

        Ok(Self {
            config,
            loader,
            history: Vec::new(),
            busy: false,
        })
    }

    /// Run one question through the pipeline: index → embed → retrieve →
    /// prompt → complete.
    ///
    /// Returns `Ok(None)` without side effects while a previous send is
    /// still in flight. The full history rides along on every request;
    /// growth is unbounded for the life of the session. On success the
    /// question/answer pair is appended to history; on failure history is
    /// untouched so the question can be resent.
    #[inline]
    pub fn send(
        &mut self,
        question: &str,
        on_chunk: Option<&mut dyn FnMut(&str)>,
    ) -> Result<Option<ChatOutcome>> {
        if self.busy {
            debug!("Send ignored: a request is already in flight");
            return Ok(None);
        }

        self.busy = true;
        let result = self.run_query(question, on_chunk);
        self.busy = false;

        result.map(Some)
    }

    /// Drop the conversation history, keeping the cached index.
    #[inline]
    pub fn clear(&mut self) {
        self.history.clear();
        info!("Conversation history cleared");
    }

    #[inline]
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    fn run_query(
        &mut self,
        question: &str,
        on_chunk: Option<&mut dyn FnMut(&str)>,
    ) -> Result<ChatOutcome> {
        // construct both clients first so a configuration problem surfaces
        // before any network traffic
        let embedder = EmbeddingClient::new(&self.config)?;
        let chat = ChatClient::new(&self.config)?;

        let index = self.loader.ensure()?;

        let query_vector = embedder.embed(question)?;
        let context = pick_top_k(index, &query_vector, self.config.index.top_k);
        info!(
            "Retrieved {} context chunks for question ({} chars)",
            context.len(),
            question.len()
        );

        let citations: Vec<Citation> = context
            .iter()
            .map(|scored| Citation {
                title: scored.entry.title.clone(),
                url: scored.entry.url.clone(),
            })
            .collect();

        let prompt = build_prompt(question, &context);

        let mut messages = Vec::with_capacity(self.history.len() + 2);
        messages.push(ChatMessage::system(prompt.system));
        messages.extend(self.history.iter().cloned());
        messages.push(ChatMessage::user(prompt.user));

        let answer = match on_chunk {
            Some(on_chunk) if self.config.chat.stream => {
                chat.complete_streaming(&messages, on_chunk)?
            }
            _ => chat.complete(&messages)?,
        };

        self.history.push(ChatMessage::user(question));
        self.history.push(ChatMessage::assistant(answer.clone()));

        Ok(ChatOutcome { answer, citations })
    }
}
