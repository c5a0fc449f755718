
use itertools::Itertools;

use crate::retrieval::ScoredEntry;

/// Fixed assistant persona for the retrieval-backed chat.
pub const SYSTEM_PROMPT: &str = "You are this blog's assistant. Answer in Markdown with \
appropriate headings, paragraphs, and lists. Keep answers concise and clearly structured. \
For technical concepts, give the standard definition first, then add detail from the blog \
content. If the context contains nothing relevant, say you are not sure.";

/// The system and user turns for one retrieval-backed question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Build the prompt pair from the raw question and the retrieved context.
///
/// Context chunks become numbered citations so the model can reference them
/// by index.
#[inline]
pub fn build_prompt(question: &str, context: &[ScoredEntry<'_>]) -> Prompt {
    let context_block = context
        .iter()
        .enumerate()
        .map(|(i, scored)| {
            format!(
                "[{}] {} — {}\n{}",
                i + 1,
                scored.entry.title,
                scored.entry.url,
                scored.entry.text
            )
        })
        .join("\n\n");

    let user = format!(
        "Context:\n{context_block}\n\nQuestion: {question}\n\nAnswer directly in Markdown with \
         clear paragraphs. Do not narrate your process or say things like \"based on the context\"."
    );

    Prompt {
        system: SYSTEM_PROMPT.to_string(),
        user,
    }
}
