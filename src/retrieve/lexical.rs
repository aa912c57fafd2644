use crate::error::Result;
use crate::retrieve::{EvidenceChunk, Retriever};
use std::collections::HashSet;

/// Common words that carry no retrieval signal.
const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "from",
    "as", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "do", "does",
    "did", "will", "would", "should", "could", "what", "which", "who", "where", "when", "why",
    "how", "this", "that", "these", "those",
];

/// Split into lowercase alphanumeric terms, dropping stop words and
/// single-character tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 2)
        .map(str::to_lowercase)
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
        .collect()
}

/// In-memory retriever ranking chunks by how many distinct query terms they
/// contain. Ties keep corpus order, so results are deterministic.
pub struct LexicalRetriever {
    chunks: Vec<EvidenceChunk>,
    terms: Vec<HashSet<String>>,
}

impl LexicalRetriever {
    pub fn new(chunks: Vec<EvidenceChunk>) -> Self {
        let terms = chunks
            .iter()
            .map(|c| tokenize(&c.text).into_iter().collect())
            .collect();
        Self { chunks, terms }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Top `k` chunks with at least one matching term.
    pub fn search(&self, query: &str, k: usize) -> Vec<EvidenceChunk> {
        let query_terms: HashSet<String> = tokenize(query).into_iter().collect();
        if query_terms.is_empty() || k == 0 {
            return Vec::new();
        }

        let mut scored: Vec<(usize, usize)> = self
            .terms
            .iter()
            .enumerate()
            .map(|(idx, terms)| (idx, query_terms.iter().filter(|t| terms.contains(*t)).count()))
            .filter(|(_, score)| *score > 0)
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1));

        scored
            .into_iter()
            .take(k)
            .map(|(idx, _)| self.chunks[idx].clone())
            .collect()
    }
}

impl Retriever for LexicalRetriever {
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<EvidenceChunk>> {
        Ok(self.search(query, k))
    }
}
