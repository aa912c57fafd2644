//! Conservative fallback: summarize raw evidence and append it to the answer.

use crate::availability::Availability;
use crate::grounding::{CitationReport, Decision, DecisionReason, SupportAnalysis};
use crate::llm::{prompts, Generator};
use crate::retrieve::EvidenceChunk;

/// Separator between the working answer and the fallback summary.
pub const FALLBACK_MARKER: &str = "\n[orchestrator summarizer fallback]\n";

#[derive(Debug, Clone, Copy)]
pub struct FallbackDecider {
    regen_ratio: f64,
    source_chars: usize,
    offline_chars: usize,
}

impl FallbackDecider {
    /// * `regen_ratio` - low-support share above which the fallback fires
    /// * `source_chars` - evidence prefix quoted in the summary prompt
    /// * `offline_chars` - excerpt length of the offline summary
    pub fn new(regen_ratio: f64, source_chars: usize, offline_chars: usize) -> Self {
        Self {
            regen_ratio,
            source_chars,
            offline_chars,
        }
    }

    /// Fires on low citation coverage or a low-support share above the
    /// ratio. The share uses the support analysis' own sentence count.
    pub fn decide(&self, citations: &CitationReport, analysis: &SupportAnalysis) -> Decision {
        let low_support = analysis.low_support_ratio() > self.regen_ratio;
        match (citations.low, low_support) {
            (true, true) => Decision::fire(DecisionReason::LowCoverageAndSupport),
            (true, false) => Decision::fire(DecisionReason::LowCitationCoverage),
            (false, true) => Decision::fire(DecisionReason::LowSupport),
            (false, false) => Decision::hold(DecisionReason::WithinTolerance),
        }
    }

    /// Summary grounded only in raw evidence text, bypassing the baseline
    /// answer path. Falls back to a truncated excerpt when the generator is
    /// offline or errors.
    pub async fn summarize<G: Generator>(
        &self,
        question: &str,
        evidence: &[EvidenceChunk],
        generator: &Availability<G>,
    ) -> String {
        let sources = prompts::join_evidence(evidence, self.source_chars);
        let generator = match generator.get() {
            Some(g) => g,
            None => return prompts::offline_summary(&sources, self.offline_chars),
        };

        let prompt = prompts::summary_prompt(question, &sources);
        match generator.complete(prompts::SUMMARY_SYSTEM_PROMPT, &prompt).await {
            Ok(summary) => summary,
            Err(e) => {
                log::warn!("Fallback summarizer failed, using excerpt: {}", e);
                prompts::offline_summary(&sources, self.offline_chars)
            }
        }
    }

    /// Append a summary below the working answer; never replaces it.
    pub fn merge(answer: &str, summary: &str) -> String {
        format!("{}{}{}", answer, FALLBACK_MARKER, summary)
    }
}
