//! Immutable graph snapshots and the shared handle readers load them from.

use std::sync::{Arc, RwLock};

use super::{build_graph, extract_mentions, validate_completeness, ImportanceScores, PageRank, StructuralCompleteness, StructuralGraph};
use crate::config::GraphConfig;
use crate::retrieve::EvidenceChunk;

/// A built graph together with its importance scores.
#[derive(Debug, Clone, Default)]
pub struct GraphIndex {
    graph: StructuralGraph,
    importance: ImportanceScores,
}

impl GraphIndex {
    pub fn build(pages: &[EvidenceChunk], cfg: &GraphConfig) -> Self {
        let graph = build_graph(&extract_mentions(pages));
        Self::from_graph(graph, PageRank::from(cfg))
    }

    pub fn from_graph(graph: StructuralGraph, ranker: PageRank) -> Self {
        let importance = ranker.rank(&graph);
        Self { graph, importance }
    }

    pub fn graph(&self) -> &StructuralGraph {
        &self.graph
    }

    pub fn importance(&self) -> &ImportanceScores {
        &self.importance
    }

    /// Importance of `id`, 0.0 when unknown.
    pub fn score(&self, id: &str) -> f64 {
        self.importance.get(id).copied().unwrap_or(0.0)
    }

    pub fn completeness(&self) -> StructuralCompleteness {
        validate_completeness(self.graph.nodes())
    }
}

/// Readers take an `Arc` of the current snapshot; a rebuild builds a new
/// index off to the side and swaps it in, so in-flight readers keep the
/// snapshot they started with.
#[derive(Debug, Default)]
pub struct SharedGraph {
    current: RwLock<Arc<GraphIndex>>,
}

impl SharedGraph {
    pub fn new(index: GraphIndex) -> Self {
        Self {
            current: RwLock::new(Arc::new(index)),
        }
    }

    pub fn load(&self) -> Arc<GraphIndex> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn replace(&self, index: GraphIndex) {
        let next = Arc::new(index);
        match self.current.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    /// Rebuild from `pages` and publish the result.
    pub fn rebuild(&self, pages: &[EvidenceChunk], cfg: &GraphConfig) -> Arc<GraphIndex> {
        let index = GraphIndex::build(pages, cfg);
        log::info!(
            "Rebuilt structural graph: {} nodes, {} edges",
            index.graph().node_count(),
            index.graph().edge_count()
        );
        self.replace(index);
        self.load()
    }
}
