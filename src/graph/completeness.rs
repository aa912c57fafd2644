//! Structural and topical completeness checks.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::{NodeKind, StructuralNode};
use crate::grounding::CitationAnalyzer;

const EXPECTED_ARTICLES: u32 = 99;
const EXPECTED_RECITALS: u32 = 173;
const MISSING_LIST_CAP: usize = 20;
const MISSING_PER_TOPIC_CAP: usize = 10;

/// How much of the regulation's numbering the graph covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructuralCompleteness {
    /// Distinct article numbers present, in range or not.
    pub articles_found: usize,
    pub recitals_found: usize,
    /// First 20 missing article numbers in 1..=99, ascending.
    pub missing_articles: Vec<u32>,
    /// First 20 missing recital numbers in 1..=173, ascending.
    pub missing_recitals: Vec<u32>,
    pub articles_complete: bool,
    pub recitals_complete: bool,
}

pub fn validate_completeness<'a, I>(nodes: I) -> StructuralCompleteness
where
    I: IntoIterator<Item = &'a StructuralNode>,
{
    let mut articles = BTreeSet::new();
    let mut recitals = BTreeSet::new();
    for node in nodes {
        let Ok(number) = node.number.parse::<u32>() else {
            continue;
        };
        match node.kind {
            NodeKind::Article => {
                articles.insert(number);
            }
            NodeKind::Recital => {
                recitals.insert(number);
            }
            NodeKind::Chapter => {}
        }
    }

    let missing = |present: &BTreeSet<u32>, upper: u32| -> Vec<u32> {
        (1..=upper).filter(|n| !present.contains(n)).collect()
    };
    let missing_articles = missing(&articles, EXPECTED_ARTICLES);
    let missing_recitals = missing(&recitals, EXPECTED_RECITALS);

    StructuralCompleteness {
        articles_found: articles.len(),
        recitals_found: recitals.len(),
        articles_complete: missing_articles.is_empty(),
        recitals_complete: missing_recitals.is_empty(),
        missing_articles: missing_articles.into_iter().take(MISSING_LIST_CAP).collect(),
        missing_recitals: missing_recitals.into_iter().take(MISSING_LIST_CAP).collect(),
    }
}

/// Thematic phrases and the articles a complete answer context should cite.
fn topic_articles() -> [(&'static str, Vec<u32>); 5] {
    [
        ("lawful basis", vec![6, 9]),
        ("data minimization", vec![5]),
        ("data subject rights", (12..=23).collect()),
        ("controller obligations", (24..=43).collect()),
        ("principles", vec![5]),
    ]
}

/// Whether a context block mentions the articles the question's topics need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SemanticCoverage {
    pub topics: Vec<String>,
    pub mentioned_articles: Vec<u32>,
    /// Topic → up to 10 missing article numbers; topics with nothing missing are omitted.
    pub missing: BTreeMap<String, Vec<u32>>,
    pub complete: bool,
}

fn infer_topics(question: &str) -> Vec<&'static str> {
    let q = question.to_lowercase();
    let mut hits: Vec<&'static str> = topic_articles()
        .iter()
        .map(|(topic, _)| *topic)
        .filter(|topic| q.contains(topic))
        .collect();
    if q.contains("rights") && !hits.contains(&"data subject rights") {
        hits.push("data subject rights");
    }
    hits
}

pub fn check_semantic_coverage(question: &str, context: &str) -> SemanticCoverage {
    let topics = infer_topics(question);
    let mentioned: BTreeSet<u32> = CitationAnalyzer::article_numbers(context).into_iter().collect();
    let table = topic_articles();

    let mut missing = BTreeMap::new();
    for topic in &topics {
        let Some((_, required)) = table.iter().find(|(name, _)| name == topic) else {
            continue;
        };
        let absent: Vec<u32> = required
            .iter()
            .copied()
            .filter(|n| !mentioned.contains(n))
            .take(MISSING_PER_TOPIC_CAP)
            .collect();
        if !absent.is_empty() {
            missing.insert(topic.to_string(), absent);
        }
    }

    SemanticCoverage {
        topics: topics.into_iter().map(String::from).collect(),
        mentioned_articles: mentioned.into_iter().collect(),
        complete: missing.is_empty(),
        missing,
    }
}
