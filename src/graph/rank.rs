//! PageRank importance over the undirected structural graph.

use std::collections::HashMap;

use super::StructuralGraph;
use crate::config::GraphConfig;

/// Node id → importance; sums to ~1.0 over a non-empty graph.
pub type ImportanceScores = HashMap<String, f64>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRank {
    pub damping: f64,
    pub max_iterations: usize,
    /// Per-node tolerance; iteration stops once the L1 change drops below `n * tolerance`.
    pub tolerance: f64,
}

impl Default for PageRank {
    fn default() -> Self {
        Self {
            damping: 0.85,
            max_iterations: 100,
            tolerance: 1e-6,
        }
    }
}

impl From<&GraphConfig> for PageRank {
    fn from(cfg: &GraphConfig) -> Self {
        Self {
            damping: cfg.damping,
            max_iterations: cfg.max_iterations,
            tolerance: cfg.tolerance,
        }
    }
}

impl PageRank {
    /// Power iteration with uniform teleport. Each undirected edge is walked
    /// in both directions; isolated nodes spread their mass uniformly.
    /// If the iteration budget runs out the last iterate is returned.
    pub fn rank(&self, graph: &StructuralGraph) -> ImportanceScores {
        let n = graph.node_count();
        if n == 0 {
            return ImportanceScores::new();
        }

        let adjacency = graph.adjacency();
        let uniform = 1.0 / n as f64;
        let mut scores = vec![uniform; n];
        let mut converged = false;

        for _ in 0..self.max_iterations {
            let dangling: f64 = adjacency
                .iter()
                .zip(&scores)
                .filter(|(nbrs, _)| nbrs.is_empty())
                .map(|(_, s)| s)
                .sum();
            let base = (1.0 - self.damping) * uniform + self.damping * dangling * uniform;

            let mut next = vec![base; n];
            for (node, nbrs) in adjacency.iter().enumerate() {
                if nbrs.is_empty() {
                    continue;
                }
                let share = self.damping * scores[node] / nbrs.len() as f64;
                for &nbr in nbrs {
                    next[nbr] += share;
                }
            }

            let err: f64 = next.iter().zip(&scores).map(|(a, b)| (a - b).abs()).sum();
            scores = next;
            if err < n as f64 * self.tolerance {
                converged = true;
                break;
            }
        }

        if !converged {
            log::warn!(
                "PageRank did not converge within {} iterations; using last iterate",
                self.max_iterations
            );
        }

        graph
            .nodes()
            .iter()
            .zip(scores)
            .map(|(node, score)| (node.id.clone(), score))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{build_graph, extract_mentions};
    use crate::retrieve::EvidenceChunk;

    fn graph_of(texts: &[&str]) -> StructuralGraph {
        let pages: Vec<_> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| EvidenceChunk::new(*t, Some(i as u32 + 1)))
            .collect();
        build_graph(&extract_mentions(&pages))
    }

    #[test]
    fn test_empty_graph() {
        assert!(PageRank::default().rank(&StructuralGraph::default()).is_empty());
    }

    #[test]
    fn test_scores_sum_to_one() {
        let graph = graph_of(&[
            "Chapter II Article 5 Article 6 Article 7",
            "Recital 39 on Article 5",
            "Article 99 alone",
        ]);
        let scores = PageRank::default().rank(&graph);
        assert_eq!(scores.len(), graph.node_count());
        let total: f64 = scores.values().sum();
        assert!((total - 1.0).abs() < 1e-6, "total = {}", total);
        assert!(scores.values().all(|&s| s > 0.0));
    }

    #[test]
    fn test_hub_outranks_leaves() {
        let graph = graph_of(&["Chapter II Article 5 Article 6 Article 7 Article 8"]);
        let scores = PageRank::default().rank(&graph);
        assert!(scores["chapter_II"] > scores["article_5"]);
        assert!((scores["article_5"] - scores["article_8"]).abs() < 1e-9);
    }

    #[test]
    fn test_isolated_nodes_are_uniform() {
        let graph = graph_of(&["Article 1", "Article 2", "Recital 3"]);
        let scores = PageRank::default().rank(&graph);
        for s in scores.values() {
            assert!((s - 1.0 / 3.0).abs() < 1e-9);
        }
    }
}
