//! Structural graph over the regulation: chapters, articles and recitals.
//!
//! Nodes are parsed from page text by regex, linked by co-location
//! (chapter → article on the same page) and explicit mention (recital →
//! article), ranked by PageRank, and expanded breadth-first from retrieval
//! anchors. A built graph is immutable; rebuilding produces a new
//! [`GraphIndex`] that is swapped into a [`SharedGraph`].

mod completeness;
mod extraction;
mod rank;
mod report;
mod retriever;
mod snapshot;
mod traversal;

pub use completeness::{check_semantic_coverage, validate_completeness, SemanticCoverage, StructuralCompleteness};
pub use extraction::{anchor_ids, build_graph, extract_mentions};
pub use rank::{ImportanceScores, PageRank};
pub use report::GraphReport;
pub use retriever::{rephrase_question, ContextBlock, GraphRetrieval, GraphRetriever, NO_STRUCTURAL_MATCH};
pub use snapshot::{GraphIndex, SharedGraph};
pub use traversal::expand_with_neighbors;

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Chapter,
    Article,
    Recital,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Chapter => "chapter",
            NodeKind::Article => "article",
            NodeKind::Recital => "recital",
        }
    }

    /// Graph id for a node of this kind, e.g. `article_5`.
    pub fn node_id(&self, number: &str) -> String {
        format!("{}_{}", self.as_str(), number)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    ChapterContains,
    RecitalReferences,
}

/// A chapter, article or recital found in the source text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuralNode {
    /// `{kind}_{number}`; unique within a graph.
    pub id: String,
    pub kind: NodeKind,
    /// Arabic numeral for articles/recitals, uppercase Roman for chapters.
    pub number: String,
    pub page: u32,
    /// Text of the page the mention came from.
    pub text: String,
}

/// Undirected edge between two node indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub a: usize,
    pub b: usize,
    pub kind: EdgeKind,
}

/// Arena-style undirected graph: nodes are addressed by stable string ids,
/// edges by node index. Only [`build_graph`] creates one.
#[derive(Debug, Clone, Default)]
pub struct StructuralGraph {
    nodes: Vec<StructuralNode>,
    index: HashMap<String, usize>,
    adjacency: Vec<Vec<usize>>,
    edges: Vec<Edge>,
    edge_pairs: HashSet<(usize, usize)>,
}

impl StructuralGraph {
    /// Insert a node, or overwrite the attributes of the node with the same
    /// id while keeping its position and edges; returns its index.
    fn insert_node(&mut self, node: StructuralNode) -> usize {
        if let Some(&idx) = self.index.get(&node.id) {
            self.nodes[idx] = node;
            return idx;
        }
        let idx = self.nodes.len();
        self.index.insert(node.id.clone(), idx);
        self.nodes.push(node);
        self.adjacency.push(Vec::new());
        idx
    }

    /// Link two existing nodes; duplicates and self-loops are ignored.
    fn link(&mut self, from: &str, to: &str, kind: EdgeKind) -> bool {
        let (a, b) = match (self.index.get(from), self.index.get(to)) {
            (Some(&a), Some(&b)) if a != b => (a, b),
            _ => return false,
        };
        if !self.edge_pairs.insert((a.min(b), a.max(b))) {
            return false;
        }
        self.adjacency[a].push(b);
        self.adjacency[b].push(a);
        self.edges.push(Edge { a, b, kind });
        true
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&StructuralNode> {
        self.index.get(id).map(|&idx| &self.nodes[idx])
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> &[StructuralNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Neighbor ids in the order their edges were added.
    pub fn neighbors(&self, id: &str) -> impl Iterator<Item = &str> + '_ {
        self.index
            .get(id)
            .into_iter()
            .flat_map(move |&idx| self.adjacency[idx].iter().map(move |&n| self.nodes[n].id.as_str()))
    }

    /// Edge kind between two nodes, if linked.
    pub fn edge_kind(&self, a: &str, b: &str) -> Option<EdgeKind> {
        let (a, b) = (*self.index.get(a)?, *self.index.get(b)?);
        self.edges
            .iter()
            .find(|e| (e.a == a && e.b == b) || (e.a == b && e.b == a))
            .map(|e| e.kind)
    }

    pub(crate) fn adjacency(&self) -> &[Vec<usize>] {
        &self.adjacency
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(kind: NodeKind, number: &str, page: u32) -> StructuralNode {
        StructuralNode {
            id: kind.node_id(number),
            kind,
            number: number.to_string(),
            page,
            text: String::new(),
        }
    }

    #[test]
    fn test_insert_is_idempotent_by_id() {
        let mut g = StructuralGraph::default();
        let first = g.insert_node(node(NodeKind::Article, "5", 1));
        let second = g.insert_node(node(NodeKind::Article, "5", 9));
        assert_eq!(first, second);
        assert_eq!(g.node_count(), 1);
        assert_eq!(g.node("article_5").unwrap().page, 9);
        assert_eq!(g.nodes()[0].id, "article_5");
    }

    #[test]
    fn test_link_requires_existing_endpoints() {
        let mut g = StructuralGraph::default();
        g.insert_node(node(NodeKind::Chapter, "II", 1));
        g.insert_node(node(NodeKind::Article, "5", 1));
        assert!(g.link("chapter_II", "article_5", EdgeKind::ChapterContains));
        assert!(!g.link("chapter_II", "article_5", EdgeKind::ChapterContains));
        assert!(!g.link("article_5", "article_5", EdgeKind::ChapterContains));
        assert!(!g.link("chapter_II", "article_99", EdgeKind::ChapterContains));
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.neighbors("article_5").collect::<Vec<_>>(), vec!["chapter_II"]);
        assert_eq!(g.edge_kind("article_5", "chapter_II"), Some(EdgeKind::ChapterContains));
    }

    #[test]
    fn test_neighbors_of_unknown_node_is_empty() {
        let g = StructuralGraph::default();
        assert_eq!(g.neighbors("article_1").count(), 0);
    }
}
