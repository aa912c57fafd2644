//! BFS neighborhood expansion over the structural graph.

use std::collections::{HashSet, VecDeque};

use super::StructuralGraph;

/// Expand `anchors` by up to `depth` hops.
///
/// The result starts with the anchors in their given order (duplicates
/// removed), followed by newly reached nodes in BFS order. Anchors unknown
/// to the graph are kept but contribute no neighbors.
pub fn expand_with_neighbors(graph: &StructuralGraph, anchors: &[String], depth: usize) -> Vec<String> {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    let mut result = Vec::new();

    for anchor in anchors {
        if visited.insert(anchor.as_str()) {
            queue.push_back((anchor.as_str(), 0));
            result.push(anchor.clone());
        }
    }

    while let Some((id, hops)) = queue.pop_front() {
        if hops >= depth {
            continue;
        }
        for nbr in graph.neighbors(id) {
            if visited.insert(nbr) {
                queue.push_back((nbr, hops + 1));
                result.push(nbr.to_string());
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{build_graph, extract_mentions};
    use crate::retrieve::EvidenceChunk;

    fn sample_graph() -> StructuralGraph {
        // chapter_II links article_5 and article_6; recital_39 links article_5; article_30 isolated
        let pages = vec![
            EvidenceChunk::new("Chapter II Article 5 Article 6", Some(1)),
            EvidenceChunk::new("Recital 39 explains Article 5", Some(2)),
            EvidenceChunk::new("Article 30 records", Some(3)),
        ];
        build_graph(&extract_mentions(&pages))
    }

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_depth_zero_returns_anchors() {
        let g = sample_graph();
        let anchors = ids(&["article_5", "article_5", "article_30"]);
        assert_eq!(expand_with_neighbors(&g, &anchors, 0), ids(&["article_5", "article_30"]));
    }

    #[test]
    fn test_single_hop_superset_of_anchors() {
        let g = sample_graph();
        let anchors = ids(&["article_5"]);
        let expanded = expand_with_neighbors(&g, &anchors, 1);
        assert_eq!(expanded[0], "article_5");
        assert!(expanded.contains(&"chapter_II".to_string()));
        assert!(expanded.contains(&"recital_39".to_string()));
        assert!(!expanded.contains(&"article_6".to_string()));
    }

    #[test]
    fn test_two_hops_reach_siblings() {
        let g = sample_graph();
        let expanded = expand_with_neighbors(&g, &ids(&["article_5"]), 2);
        assert!(expanded.contains(&"article_6".to_string()));
        assert!(!expanded.contains(&"article_30".to_string()));
    }

    #[test]
    fn test_unknown_anchor_kept() {
        let g = sample_graph();
        let expanded = expand_with_neighbors(&g, &ids(&["article_77"]), 1);
        assert_eq!(expanded, ids(&["article_77"]));
    }

    #[test]
    fn test_deterministic() {
        let g = sample_graph();
        let anchors = ids(&["recital_39", "article_30"]);
        assert_eq!(
            expand_with_neighbors(&g, &anchors, 2),
            expand_with_neighbors(&g, &anchors, 2)
        );
    }
}
