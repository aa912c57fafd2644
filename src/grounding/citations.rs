//! Structural citation extraction, density and cross-verification.

use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::OnceLock;

fn citation_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Article\s+\d+|p\.\d+").expect("Invalid regex pattern"))
}

fn article_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Article\s+(\d+)").expect("Invalid regex pattern"))
}

fn sentence_end_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?]\s+").expect("Invalid regex pattern"))
}

/// Citation density of an answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CitationReport {
    /// Raw markers in order of appearance, duplicates kept.
    pub citations: Vec<String>,
    pub sentence_count: usize,
    /// `citations / max(sentence_count, 1)`.
    pub coverage: f64,
    pub low: bool,
}

/// Cited article numbers checked against a context block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CitationVerification {
    /// Deduplicated, first-seen order.
    pub cited: Vec<u32>,
    /// Cited numbers absent from the context, in `cited` order.
    pub missing: Vec<u32>,
    pub all_present: bool,
}

/// Extracts "Article N" / "p.N" markers and scores citation coverage.
#[derive(Debug, Clone, Copy)]
pub struct CitationAnalyzer {
    min_coverage: f64,
}

impl CitationAnalyzer {
    pub fn new(min_coverage: f64) -> Self {
        Self { min_coverage }
    }

    /// Every citation marker in `text`, duplicates retained.
    pub fn extract_citations(text: &str) -> Vec<String> {
        citation_regex()
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Distinct article numbers in first-seen order.
    pub fn article_numbers(text: &str) -> Vec<u32> {
        let mut seen = HashSet::new();
        article_regex()
            .captures_iter(text)
            .filter_map(|cap| cap[1].parse::<u32>().ok())
            .filter(|n| seen.insert(*n))
            .collect()
    }

    /// Non-empty fragments after splitting on terminal punctuation + whitespace.
    pub fn sentence_count(text: &str) -> usize {
        sentence_end_regex()
            .split(text)
            .filter(|s| !s.trim().is_empty())
            .count()
    }

    pub fn coverage(&self, answer: &str) -> CitationReport {
        let citations = Self::extract_citations(answer);
        let sentence_count = Self::sentence_count(answer);
        let coverage = citations.len() as f64 / sentence_count.max(1) as f64;
        CitationReport {
            citations,
            sentence_count,
            coverage,
            low: coverage < self.min_coverage,
        }
    }

    pub fn verify(&self, answer: &str, context: &str) -> CitationVerification {
        let cited = Self::article_numbers(answer);
        let present: HashSet<u32> = Self::article_numbers(context).into_iter().collect();
        let missing: Vec<u32> = cited.iter().copied().filter(|n| !present.contains(n)).collect();
        CitationVerification {
            all_present: missing.is_empty(),
            cited,
            missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> CitationAnalyzer {
        CitationAnalyzer::new(0.3)
    }

    #[test]
    fn test_no_citations_is_low() {
        let report = analyzer().coverage("No citations here at all.");
        assert_eq!(report.coverage, 0.0);
        assert!(report.low);
        assert_eq!(report.sentence_count, 1);
    }

    #[test]
    fn test_coverage_is_citations_over_sentences() {
        let report = analyzer().coverage("Article 5 applies. See p.7 for detail. Article 5 again. Plain sentence.");
        assert_eq!(report.citations, vec!["Article 5", "p.7", "Article 5"]);
        assert_eq!(report.sentence_count, 4);
        assert_eq!(report.coverage, 3.0 / 4.0);
        assert!(!report.low);
    }

    #[test]
    fn test_low_flag_boundary() {
        // 1 citation over 4 sentences = 0.25 < 0.3
        let report = analyzer().coverage("Article 1 applies. Two. Three. Four.");
        assert_eq!(report.coverage, 0.25);
        assert!(report.low);

        // exactly at the threshold is not low
        let report = CitationAnalyzer::new(0.25).coverage("Article 1 applies. Two. Three. Four.");
        assert!(!report.low);
    }

    #[test]
    fn test_empty_answer_degrades() {
        let report = analyzer().coverage("");
        assert_eq!(report.sentence_count, 0);
        assert_eq!(report.coverage, 0.0);
        assert!(report.low);
    }

    #[test]
    fn test_verify_reports_missing_in_cited_order() {
        let v = analyzer().verify("See Article 6 and Article 9.", "Article 6 applies.");
        assert_eq!(v.cited, vec![6, 9]);
        assert_eq!(v.missing, vec![9]);
        assert!(!v.all_present);
    }

    #[test]
    fn test_verify_deduplicates_cited() {
        let v = analyzer().verify("Article 9, Article 6, Article 9.", "Article 9 and Article 6");
        assert_eq!(v.cited, vec![9, 6]);
        assert!(v.missing.is_empty());
        assert!(v.all_present);
    }

    #[test]
    fn test_verify_empty_context_all_missing() {
        let v = analyzer().verify("Article 17 grants erasure. Article 21 grants objection.", "");
        assert_eq!(v.missing, vec![17, 21]);
        assert!(!v.all_present);
    }

    #[test]
    fn test_page_markers_not_article_numbers() {
        assert_eq!(CitationAnalyzer::article_numbers("see p.12 and article 3"), Vec::<u32>::new());
    }
}
