use tiktoken_rs::CoreBPE;
use tracing::{debug, warn};

use crate::domain::entities::EnrichedSource;
use crate::domain::entities::book::title_from_filename;
use crate::domain::repositories::ChunkHit;

#[derive(Debug, Clone, PartialEq)]
pub struct BuiltContext {
    pub text: String,
    pub chunk_count: usize,
    pub tokens: usize,
}

/// Packs ranked chunks into a prompt context under a token budget.
pub struct ContextBuilder {
    bpe: Option<CoreBPE>,
    max_tokens: usize,
}

impl ContextBuilder {
    pub fn new(max_tokens: usize) -> Self {
        let bpe = match tiktoken_rs::cl100k_base() {
            Ok(bpe) => Some(bpe),
            Err(e) => {
                warn!("cl100k_base tokenizer unavailable ({}), estimating tokens from length", e);
                None
            }
        };
        Self { bpe, max_tokens }
    }

    pub fn count_tokens(&self, text: &str) -> usize {
        match &self.bpe {
            Some(bpe) => bpe.encode_with_special_tokens(text).len(),
            None => text.chars().count().div_ceil(4),
        }
    }

    /// Chunks are taken in rank order; the first one that would overflow the
    /// budget ends the context.
    pub fn build(&self, hits: &[ChunkHit], sources: &[EnrichedSource]) -> BuiltContext {
        let mut sections: Vec<String> = Vec::new();
        let mut tokens = 0usize;

        for hit in hits {
            let title = sources
                .iter()
                .find(|s| s.filename == hit.chunk.filename())
                .map(|s| s.display_title.clone())
                .unwrap_or_else(|| title_from_filename(hit.chunk.filename()));

            let section = format!("{}\n{}", citation_header(&title, hit.chunk.page_number()), hit.chunk.content());
            let section_tokens = self.count_tokens(&section);
            if tokens + section_tokens > self.max_tokens {
                debug!(
                    "Context budget of {} tokens reached after {} chunks",
                    self.max_tokens,
                    sections.len()
                );
                break;
            }

            tokens += section_tokens;
            sections.push(section);
        }

        BuiltContext {
            chunk_count: sections.len(),
            text: sections.join("\n\n"),
            tokens,
        }
    }
}

pub fn citation_header(title: &str, page: Option<i32>) -> String {
    match page {
        Some(page) => format!("[Source: {} — page {}]", title, page),
        None => format!("[Source: {}]", title),
    }
}
