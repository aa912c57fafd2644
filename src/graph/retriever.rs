//! Graph-augmented retrieval: anchor chunks → structural nodes → ranked neighborhood.

use regex::{NoExpand, Regex, RegexBuilder};
use serde::Serialize;
use std::sync::{Arc, OnceLock};

use super::{
    anchor_ids, check_semantic_coverage, expand_with_neighbors, GraphReport, NodeKind, SemanticCoverage, SharedGraph,
    StructuralCompleteness, StructuralNode,
};
use crate::config::GraphConfig;
use crate::error::Result;
use crate::retrieve::{EvidenceChunk, Retrieval, Retriever};
use crate::text::prefix_chars;

/// Context returned when no retrieved chunk maps onto a graph node.
pub const NO_STRUCTURAL_MATCH: &str = "No structural nodes matched anchor retrieval.";

const REPHRASINGS: [(&str, &str); 5] = [
    ("personal data", "personal data (as defined by GDPR Article 4)"),
    ("data minimization", "data minimization principle (Article 5)"),
    ("lawful basis", "lawful basis for processing (Articles 6 and 9)"),
    ("data subject rights", "data subject rights (Articles 12-23)"),
    ("controller obligations", "controller obligations (Chapter IV, Articles 24-43)"),
];

fn rephrase_patterns() -> &'static [(Regex, &'static str)] {
    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        REPHRASINGS
            .iter()
            .filter_map(|(phrase, expansion)| {
                RegexBuilder::new(&regex::escape(phrase))
                    .case_insensitive(true)
                    .build()
                    .ok()
                    .map(|re| (re, *expansion))
            })
            .collect()
    })
}

/// Expand common privacy phrasings into explicit regulatory references so
/// anchor retrieval hits the right articles. Matching is case-insensitive.
pub fn rephrase_question(question: &str) -> String {
    let mut q = question.trim().to_string();
    for (re, expansion) in rephrase_patterns() {
        if re.is_match(&q) {
            q = re.replace_all(&q, NoExpand(expansion)).into_owned();
        }
    }
    q
}

/// One rendered node of graph context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextBlock {
    pub node_id: String,
    pub kind: NodeKind,
    pub number: String,
    pub page: u32,
    pub full: bool,
    /// Node text (or its prefix) with newlines flattened to spaces.
    pub content: String,
}

impl ContextBlock {
    fn from_node(node: &StructuralNode, full: bool, snippet_chars: usize) -> Self {
        let text = if full {
            node.text.as_str()
        } else {
            prefix_chars(&node.text, snippet_chars)
        };
        Self {
            node_id: node.id.clone(),
            kind: node.kind,
            number: node.number.clone(),
            page: node.page,
            full,
            content: text.replace('\n', " "),
        }
    }

    /// `[article:5] p.35 (snippet) ...`
    pub fn render(&self) -> String {
        format!(
            "[{}:{}] p.{} ({}) {}",
            self.kind,
            self.number,
            self.page,
            if self.full { "full" } else { "snippet" },
            self.content
        )
    }

    fn into_chunk(self) -> EvidenceChunk {
        let text = self.render();
        EvidenceChunk {
            text,
            page: Some(self.page),
            section_header: Some(format!("{} {}", self.kind, self.number)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphRetrieval {
    /// Question as asked, trimmed.
    pub original: String,
    /// Query actually sent to the anchor retriever.
    pub query: String,
    /// Rendered blocks joined by blank lines, or [`NO_STRUCTURAL_MATCH`].
    pub context: String,
    /// Every expanded node id, highest importance first.
    pub node_ids: Vec<String>,
    /// The rendered top `2k` of `node_ids`.
    pub blocks: Vec<ContextBlock>,
    pub anchors: Vec<String>,
    /// Raw chunks from the anchor retriever.
    pub anchor_chunks: Vec<EvidenceChunk>,
    pub semantic: SemanticCoverage,
    /// Completeness of the snapshot the retrieval ran against.
    pub structural: StructuralCompleteness,
    pub full_pages: bool,
}

impl GraphRetrieval {
    pub fn matched(&self) -> bool {
        !self.node_ids.is_empty()
    }

    pub fn report(&self) -> GraphReport {
        GraphReport {
            original: self.original.clone(),
            query: self.query.clone(),
            anchors: self.anchors.len(),
            expanded_nodes: self.node_ids.len(),
            full_pages: self.full_pages,
            structural: self.structural.clone(),
            semantic: self.semantic.clone(),
        }
    }

    /// Rendered blocks as evidence, or the raw anchor chunks when no
    /// structural node matched.
    pub fn into_evidence(self) -> Vec<EvidenceChunk> {
        if self.matched() {
            self.blocks.into_iter().map(ContextBlock::into_chunk).collect()
        } else {
            self.anchor_chunks
        }
    }
}

/// Wraps an anchor [`Retriever`] and answers with ranked structural context.
pub struct GraphRetriever<R> {
    anchors: R,
    graph: Arc<SharedGraph>,
    config: GraphConfig,
}

impl<R: Retriever> GraphRetriever<R> {
    pub fn new(anchors: R, graph: Arc<SharedGraph>, config: GraphConfig) -> Self {
        Self { anchors, graph, config }
    }

    /// Retrieve `k` anchor chunks, map them to graph nodes, expand by the
    /// configured depth and render the `2k` most important nodes.
    pub async fn retrieve(&self, question: &str, k: usize) -> Result<GraphRetrieval> {
        let original = question.trim().to_string();
        let query = if self.config.rephrase {
            rephrase_question(question)
        } else {
            original.clone()
        };

        let anchor_chunks = self.anchors.similarity_search(&query, k).await?;
        let index = self.graph.load();
        let anchors = anchor_ids(&anchor_chunks, index.graph());
        let structural = index.completeness();
        let full_pages = self.config.full_pages;

        if anchors.is_empty() {
            log::debug!("No structural anchors among {} retrieved chunks", anchor_chunks.len());
            return Ok(GraphRetrieval {
                original,
                query,
                context: NO_STRUCTURAL_MATCH.to_string(),
                node_ids: Vec::new(),
                blocks: Vec::new(),
                anchors,
                anchor_chunks,
                semantic: check_semantic_coverage(question, ""),
                structural,
                full_pages,
            });
        }

        let mut node_ids = expand_with_neighbors(index.graph(), &anchors, self.config.neighbor_depth);
        // Stable: equal scores keep expansion order.
        node_ids.sort_by(|a, b| index.score(b).total_cmp(&index.score(a)));

        let blocks: Vec<ContextBlock> = node_ids
            .iter()
            .take(k.saturating_mul(2))
            .filter_map(|id| index.graph().node(id))
            .map(|node| ContextBlock::from_node(node, full_pages, self.config.snippet_chars))
            .collect();

        let context = blocks
            .iter()
            .map(ContextBlock::render)
            .collect::<Vec<_>>()
            .join("\n\n");
        let semantic = check_semantic_coverage(question, &context);

        log::debug!(
            "Graph retrieval: {} anchors, {} expanded, {} rendered",
            anchors.len(),
            node_ids.len(),
            blocks.len()
        );

        Ok(GraphRetrieval {
            original,
            query,
            context,
            node_ids,
            blocks,
            anchors,
            anchor_chunks,
            semantic,
            structural,
            full_pages,
        })
    }
}

impl<R: Retriever> Retriever for GraphRetriever<R> {
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<EvidenceChunk>> {
        Ok(self.retrieve(query, k).await?.into_evidence())
    }

    /// Evidence plus the [`GraphReport`] for the audit trail and footer.
    async fn retrieve_evidence(&self, query: &str, k: usize) -> Result<Retrieval> {
        let retrieval = self.retrieve(query, k).await?;
        let report = retrieval.report();
        Ok(Retrieval {
            chunks: retrieval.into_evidence(),
            graph: Some(report),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphIndex;
    use crate::test_support::FixedRetriever;

    fn corpus() -> Vec<EvidenceChunk> {
        vec![
            EvidenceChunk::new("Chapter II Principles\nArticle 5 Principles relating to processing.", Some(35)),
            EvidenceChunk::new("Article 6 Lawfulness of processing. Article 7 Consent. Chapter II continues.", Some(36)),
            EvidenceChunk::new("Recital 39 Any processing should be lawful, see Article 5.", Some(7)),
            EvidenceChunk::new("Article 9 special categories of personal data.", Some(38)),
        ]
    }

    fn shared(cfg: &GraphConfig) -> Arc<SharedGraph> {
        Arc::new(SharedGraph::new(GraphIndex::build(&corpus(), cfg)))
    }

    #[test]
    fn test_rephrase_expands_case_insensitively() {
        assert_eq!(
            rephrase_question("  What is the Lawful Basis? "),
            "What is the lawful basis for processing (Articles 6 and 9)?"
        );
        assert_eq!(rephrase_question("unrelated question"), "unrelated question");
        let q = rephrase_question("personal data and data subject rights");
        assert!(q.starts_with("personal data (as defined by GDPR Article 4)"));
        assert!(q.ends_with("data subject rights (Articles 12-23)"));
    }

    #[tokio::test]
    async fn test_no_anchor_returns_sentinel() {
        let cfg = GraphConfig::default();
        let anchors = FixedRetriever::new(vec![EvidenceChunk::new("no structure here", Some(1))]);
        let retriever = GraphRetriever::new(anchors, shared(&cfg), cfg);

        let r = retriever.retrieve("anything", 5).await.unwrap();
        assert_eq!(r.context, NO_STRUCTURAL_MATCH);
        assert!(r.node_ids.is_empty());
        assert!(!r.matched());

        // As a plain retriever it degrades to the anchor chunks.
        let chunks = retriever.similarity_search("anything", 5).await.unwrap();
        assert_eq!(chunks[0].text, "no structure here");
    }

    #[tokio::test]
    async fn test_expansion_and_rendering() {
        let cfg = GraphConfig::default();
        let anchors = FixedRetriever::new(vec![EvidenceChunk::new("Under Article 5 data must be minimised", Some(1))]);
        let retriever = GraphRetriever::new(anchors, shared(&cfg), cfg);

        let r = retriever.retrieve("principles", 5).await.unwrap();
        assert_eq!(r.anchors, vec!["article_5"]);
        for id in ["article_5", "chapter_II", "recital_39"] {
            assert!(r.node_ids.contains(&id.to_string()), "missing {}", id);
        }
        // chapter_II is the hub; it ranks first.
        assert_eq!(r.node_ids[0], "chapter_II");
        let article = r.blocks.iter().find(|b| b.node_id == "article_5").unwrap();
        assert_eq!(
            article.render(),
            "[article:5] p.7 (snippet) Recital 39 Any processing should be lawful, see Article 5."
        );
        assert!(r.context.contains("\n\n"));
        assert!(r.semantic.complete);
    }

    #[tokio::test]
    async fn test_block_limit_and_full_pages() {
        let cfg = GraphConfig {
            neighbor_depth: 3,
            full_pages: true,
            ..GraphConfig::default()
        };
        let anchors = FixedRetriever::new(vec![EvidenceChunk::new("Article 5", None)]);
        let retriever = GraphRetriever::new(anchors, shared(&cfg), cfg);

        let r = retriever.retrieve("q", 1).await.unwrap();
        assert!(r.node_ids.len() > 2);
        assert_eq!(r.blocks.len(), 2);
        assert!(r.blocks.iter().all(|b| b.full));
        assert!(r.context.contains("(full)"));
    }

    #[tokio::test]
    async fn test_rephrased_query_reaches_anchor_retriever() {
        let cfg = GraphConfig::default();
        let anchors = FixedRetriever::new(corpus());
        let retriever = GraphRetriever::new(anchors, shared(&cfg), cfg);

        retriever.retrieve("lawful basis?", 2).await.unwrap();
        let queries = retriever.anchors.queries();
        assert_eq!(queries, vec!["lawful basis for processing (Articles 6 and 9)?"]);
    }

    #[tokio::test]
    async fn test_evidence_carries_graph_report() {
        let cfg = GraphConfig::default();
        let anchors = FixedRetriever::new(vec![EvidenceChunk::new("Article 6 Lawfulness of processing.", Some(36))]);
        let retriever = GraphRetriever::new(anchors, shared(&cfg), cfg);

        let evidence = retriever.retrieve_evidence("  What is the lawful basis? ", 5).await.unwrap();
        let report = evidence.graph.unwrap();
        assert_eq!(report.original, "What is the lawful basis?");
        assert!(report.rephrased());
        assert_eq!(report.anchors, 1);
        assert_eq!(report.expanded_nodes, evidence.chunks.len());
        assert_eq!(report.structural, retriever.graph.load().completeness());
        assert!(!report.semantic.complete);
        assert!(evidence.chunks.iter().any(|c| c.text.starts_with("[article:6] p.36")));
    }

    #[tokio::test]
    async fn test_plain_retriever_has_no_graph_report() {
        let evidence = FixedRetriever::new(corpus()).retrieve_evidence("q", 2).await.unwrap();
        assert!(evidence.graph.is_none());
        assert_eq!(evidence.chunks.len(), 2);
    }

    #[tokio::test]
    async fn test_anchor_failure_propagates() {
        let cfg = GraphConfig::default();
        let retriever = GraphRetriever::new(FixedRetriever::failing(), shared(&cfg), cfg);
        assert!(retriever.retrieve("q", 3).await.is_err());
    }
}
