//! Aggregate grounding metrics over an audit trail.

use crate::audit::{events, AuditEvent};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditMetrics {
    /// Completed orchestrator runs.
    pub runs: usize,
    pub total_events: usize,
    pub citation_coverage_avg: f64,
    pub fallback_rate: f64,
    pub regeneration_rate: f64,
    pub low_support_avg: f64,
    pub retrieval_avg_docs: f64,
}

impl AuditMetrics {
    pub fn from_events(all: &[AuditEvent]) -> Self {
        let mut coverage = Vec::new();
        let mut low_support = Vec::new();
        let mut fallbacks = 0usize;
        let mut regenerations = 0usize;
        let mut retrieved = Vec::new();

        for e in all {
            match e.event.as_str() {
                events::RUN_COMPLETE => {
                    coverage.push(e.payload["citation_coverage"].as_f64().unwrap_or(0.0));
                    low_support.push(e.payload["low_support_count"].as_f64().unwrap_or(0.0));
                    if e.payload["fallback_used"].as_bool().unwrap_or(false) {
                        fallbacks += 1;
                    }
                    if e.payload["regenerated"].as_bool().unwrap_or(false) {
                        regenerations += 1;
                    }
                }
                events::RETRIEVAL => {
                    retrieved.push(e.payload["retrieved"].as_f64().unwrap_or(0.0));
                }
                _ => {}
            }
        }

        let runs = coverage.len();
        Self {
            runs,
            total_events: all.len(),
            citation_coverage_avg: mean(&coverage),
            fallback_rate: rate(fallbacks, runs),
            regeneration_rate: rate(regenerations, runs),
            low_support_avg: mean(&low_support),
            retrieval_avg_docs: mean(&retrieved),
        }
    }

    pub fn format_report(&self) -> String {
        if self.total_events == 0 {
            return "No audit events collected yet. Run some queries first.".to_string();
        }
        [
            "Grounding Metrics Summary:".to_string(),
            format!("Runs: {}", self.runs),
            format!("Citation Coverage (avg): {:.2}", self.citation_coverage_avg),
            format!("Fallback Rate: {:.2}", self.fallback_rate),
            format!("Regeneration Rate: {:.2}", self.regeneration_rate),
            format!("Low-Support Sentences (avg): {:.2}", self.low_support_avg),
            format!("Retrieval Docs (avg): {:.2}", self.retrieval_avg_docs),
            format!("Total Events: {}", self.total_events),
        ]
        .join("\n")
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn rate(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}
