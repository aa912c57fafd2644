//! Structural node extraction from page text (regex-based) and graph assembly.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use super::{EdgeKind, NodeKind, StructuralGraph, StructuralNode};
use crate::retrieve::EvidenceChunk;

fn article_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bArticle\s+(\d+)\b").expect("Invalid regex pattern"))
}

fn recital_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bRecital\s+(\d+)\b").expect("Invalid regex pattern"))
}

fn chapter_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bChapter\s+([IVXLC]+)\b").expect("Invalid regex pattern"))
}

/// Leading zeros dropped; numbers too large for u32 are kept verbatim.
fn normalize_number(digits: &str) -> String {
    digits
        .parse::<u32>()
        .map(|n| n.to_string())
        .unwrap_or_else(|_| digits.to_string())
}

fn numbers<'a>(re: &'static Regex, text: &'a str) -> impl Iterator<Item = String> + 'a {
    re.captures_iter(text).map(|cap| normalize_number(&cap[1]))
}

/// One node per regex match, per page, in page order.
///
/// Within a page articles come first, then recitals, then chapters. The
/// page number is the chunk's own page or, when absent, its position.
/// Duplicates are kept here; [`build_graph`] deduplicates by id.
pub fn extract_mentions(pages: &[EvidenceChunk]) -> Vec<StructuralNode> {
    let mut mentions = Vec::new();

    for (idx, chunk) in pages.iter().enumerate() {
        let page = chunk.page.unwrap_or(idx as u32);
        let mut push = |kind: NodeKind, number: String| {
            mentions.push(StructuralNode {
                id: kind.node_id(&number),
                kind,
                number,
                page,
                text: chunk.text.clone(),
            });
        };

        for number in numbers(article_regex(), &chunk.text) {
            push(NodeKind::Article, number);
        }
        for number in numbers(recital_regex(), &chunk.text) {
            push(NodeKind::Recital, number);
        }
        for cap in chapter_regex().captures_iter(&chunk.text) {
            push(NodeKind::Chapter, cap[1].to_uppercase());
        }
    }

    mentions
}

/// Assemble the structural graph from extracted mentions.
///
/// The last mention of an id sets the node's page and text. Edges use
/// every mention: a chapter links to each article mentioned on the same
/// page, and a recital links to each article its text names, provided that
/// article exists as a node.
pub fn build_graph(mentions: &[StructuralNode]) -> StructuralGraph {
    let mut graph = StructuralGraph::default();
    for mention in mentions {
        graph.insert_node(mention.clone());
    }

    let of_kind = |kind: NodeKind| mentions.iter().filter(move |m| m.kind == kind);

    for chapter in of_kind(NodeKind::Chapter) {
        for article in of_kind(NodeKind::Article).filter(|a| a.page == chapter.page) {
            graph.link(&chapter.id, &article.id, EdgeKind::ChapterContains);
        }
    }

    for recital in of_kind(NodeKind::Recital) {
        for number in numbers(article_regex(), &recital.text) {
            let article_id = NodeKind::Article.node_id(&number);
            graph.link(&recital.id, &article_id, EdgeKind::RecitalReferences);
        }
    }

    log::debug!(
        "Built structural graph: {} nodes, {} edges from {} mentions",
        graph.node_count(),
        graph.edge_count(),
        mentions.len()
    );
    graph
}

/// Graph ids for the articles and recitals a chunk mentions.
///
/// Only ids present in `graph` are returned, deduplicated in first-seen
/// order (articles before recitals within each chunk).
pub fn anchor_ids(chunks: &[EvidenceChunk], graph: &StructuralGraph) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut anchors = Vec::new();

    for chunk in chunks {
        let articles = numbers(article_regex(), &chunk.text).map(|n| NodeKind::Article.node_id(&n));
        let recitals = numbers(recital_regex(), &chunk.text).map(|n| NodeKind::Recital.node_id(&n));
        for id in articles.chain(recitals) {
            if graph.contains(&id) && seen.insert(id.clone()) {
                anchors.push(id);
            }
        }
    }

    anchors
}
