
use itertools::Itertools;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::{AssistantError, Result};

const FETCH_TIMEOUT_SECONDS: u64 = 30;

/// One chunk of source content from the prebuilt embedding index.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct IndexEntry {
    /// Groups chunks belonging to the same source document. The site
    /// generator emits this as `postId`.
    #[serde(rename = "postId", alias = "documentId")]
    pub document_id: String,
    pub title: String,
    pub url: String,
    pub text: String,
    pub vector: Vec<f32>,
}

/// Immutable snapshot of the embedding index, loaded at most once per
/// session.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Index {
    pub dim: usize,
    pub items: Vec<IndexEntry>,
}

impl Index {
    /// Parse and validate an index document
    pub(crate) fn from_json(body: &str) -> Result<Self> {
        let index: Index = serde_json::from_str(body)
            .map_err(|e| AssistantError::IndexInvalid(format!("malformed index document: {e}")))?;
        index.validate()?;
        Ok(index)
    }

    /// Every entry's vector must match the declared dimensionality.
    fn validate(&self) -> Result<()> {
        for (i, entry) in self.items.iter().enumerate() {
            if entry.vector.len() != self.dim {
                return Err(AssistantError::IndexInvalid(format!(
                    "entry {} ({}) has vector length {} but the index declares dim {}",
                    i,
                    entry.document_id,
                    entry.vector.len(),
                    self.dim
                )));
            }
        }
        Ok(())
    }

    /// Number of distinct source documents across all chunks
    #[inline]
    pub fn distinct_documents(&self) -> usize {
        self.items
            .iter()
            .map(|entry| entry.document_id.as_str())
            .unique()
            .count()
    }
}

/// Fetches and caches the index document. The first successful fetch is kept
/// for the life of the session; failed fetches are only retried by the next
/// query.
#[derive(Debug)]
pub struct IndexLoader {
    url: Url,
    agent: ureq::Agent,
    cached: Option<Index>,
}

impl IndexLoader {
    #[inline]
    pub fn new(url: Url) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(FETCH_TIMEOUT_SECONDS)))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            url,
            agent,
            cached: None,
        }
    }

    /// Return the cached index, fetching it on first use
    #[inline]
    pub fn ensure(&mut self) -> Result<&Index> {
        if self.cached.is_none() {
            let index = self.fetch()?;
            info!(
                "Loaded embedding index: {} entries, dim {}",
                index.items.len(),
                index.dim
            );
            self.cached = Some(index);
        }

        Ok(self.cached.as_ref().expect("populated above"))
    }

    fn fetch(&self) -> Result<Index> {
        debug!("Fetching embedding index from {}", self.url);

        let mut response = self
            .agent
            .get(self.url.as_str())
            // always revalidate with the origin, never serve from a cache
            .header("Cache-Control", "no-store")
            .call()?;

        let status = response.status();
        if !status.is_success() {
            return Err(AssistantError::IndexLoad {
                status: status.as_u16(),
                url: self.url.to_string(),
            });
        }

        let body = response.body_mut().read_to_string()?;
        Index::from_json(&body)
    }
}
