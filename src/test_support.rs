//! Deterministic collaborators for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::embeddings::Embedder;
use crate::error::{RegassistError, Result};
use crate::llm::Generator;
use crate::retrieve::{EvidenceChunk, Retriever};

const HASH_DIMENSIONS: usize = 256;

/// Bag-of-words embedder: each lowercase alphanumeric token increments one
/// FNV-1a bucket. Identical texts embed identically; disjoint vocabularies
/// land near zero similarity.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimensions: usize,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self {
            dimensions: HASH_DIMENSIONS,
        }
    }
}

impl HashEmbedder {
    pub fn vector(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dimensions];
        for token in text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            let mut hash: u64 = 0xcbf29ce484222325;
            for byte in token.to_lowercase().bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(0x100000001b3);
            }
            v[(hash % self.dimensions as u64) as usize] += 1.0;
        }
        v
    }
}

impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }
}

/// Hash embedder that errors on any text containing `marker`; a batch fails
/// as a whole if any member does.
#[derive(Debug, Clone)]
pub struct FailingEmbedder {
    marker: String,
    inner: HashEmbedder,
}

impl FailingEmbedder {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            inner: HashEmbedder::default(),
        }
    }

    fn check(&self, text: &str) -> Result<()> {
        if text.contains(&self.marker) {
            return Err(RegassistError::Embedding(format!("refusing to embed text containing {}", self.marker)));
        }
        Ok(())
    }
}

impl Embedder for FailingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.check(text)?;
        Ok(self.inner.vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        for text in texts {
            self.check(text)?;
        }
        Ok(texts.iter().map(|t| self.inner.vector(t)).collect())
    }
}

/// Generator that replays scripted replies in order and records every call.
/// Once the script is exhausted each call fails.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedGenerator {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `(system_prompt, user_prompt)` pairs in call order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Generator for ScriptedGenerator {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((system_prompt.to_string(), user_prompt.to_string()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| RegassistError::Generation("no scripted reply left".to_string()))
    }
}

/// Retriever that returns the first `k` of a fixed chunk list.
#[derive(Debug, Default)]
pub struct FixedRetriever {
    chunks: Vec<EvidenceChunk>,
    fail: bool,
    queries: Mutex<Vec<String>>,
}

impl FixedRetriever {
    pub fn new(chunks: Vec<EvidenceChunk>) -> Self {
        Self {
            chunks,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

impl Retriever for FixedRetriever {
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<EvidenceChunk>> {
        self.queries.lock().unwrap().push(query.to_string());
        if self.fail {
            return Err(RegassistError::Retrieval("index unavailable".to_string()));
        }
        Ok(self.chunks.iter().take(k).cloned().collect())
    }
}
