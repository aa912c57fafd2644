//! Evidence retrieval collaborator.
//!
//! Vector indexes live outside this crate; the pipeline only depends on the
//! [`Retriever`] contract. [`LexicalRetriever`] is an in-memory implementation
//! for offline use and tests.

pub mod lexical;
pub mod pages;

pub use lexical::LexicalRetriever;
pub use pages::load_pages;

use crate::error::Result;
use crate::graph::GraphReport;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// A retrieved passage of source text with its location metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceChunk {
    pub text: String,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub section_header: Option<String>,
}

impl EvidenceChunk {
    pub fn new(text: impl Into<String>, page: Option<u32>) -> Self {
        Self {
            text: text.into(),
            page,
            section_header: None,
        }
    }
}

/// Evidence for one query, with the structural report when it was
/// retrieved through the graph.
#[derive(Debug, Clone, Default)]
pub struct Retrieval {
    pub chunks: Vec<EvidenceChunk>,
    pub graph: Option<GraphReport>,
}

/// Returns the `k` most relevant chunks for a query, most relevant first.
pub trait Retriever: Send + Sync {
    fn similarity_search(&self, query: &str, k: usize) -> impl Future<Output = Result<Vec<EvidenceChunk>>> + Send;

    /// What the orchestrator calls. Plain retrievers return chunks only.
    fn retrieve_evidence(&self, query: &str, k: usize) -> impl Future<Output = Result<Retrieval>> + Send {
        async move {
            let chunks = self.similarity_search(query, k).await?;
            Ok(Retrieval { chunks, graph: None })
        }
    }
}
