//! Single-shot regeneration when too much of an answer lacks support.

use crate::availability::Availability;
use crate::grounding::{Decision, DecisionReason, SupportAnalysis};
use crate::llm::{prompts, Generator};
use crate::retrieve::EvidenceChunk;
use serde::Serialize;

/// Result of a regeneration attempt. `answer` is the input answer unless
/// `regenerated` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegenerationOutcome {
    pub answer: String,
    pub regenerated: bool,
    pub reason: DecisionReason,
    /// Sentences that prompted the rewrite; empty when nothing fired.
    pub low_support_before: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct RegenerationDecider {
    regen_ratio: f64,
    source_chars: usize,
}

impl RegenerationDecider {
    pub fn new(regen_ratio: f64, source_chars: usize) -> Self {
        Self {
            regen_ratio,
            source_chars,
        }
    }

    /// Fires only for an online analysis whose low-support share strictly
    /// exceeds the ratio.
    pub fn decide(&self, analysis: &SupportAnalysis) -> Decision {
        if analysis.offline {
            return Decision::hold(DecisionReason::Offline);
        }
        if analysis.sentences.is_empty() {
            return Decision::hold(DecisionReason::NoSentences);
        }
        if analysis.low_support_ratio() <= self.regen_ratio {
            return Decision::hold(DecisionReason::RatioOk);
        }
        Decision::fire(DecisionReason::RegenTrigger)
    }

    /// Decide, and if the decision fires, make exactly one regeneration call.
    pub async fn regenerate<G: Generator>(
        &self,
        question: &str,
        answer: &str,
        evidence: &[EvidenceChunk],
        analysis: &SupportAnalysis,
        generator: &Availability<G>,
    ) -> RegenerationOutcome {
        let decision = self.decide(analysis);
        if !decision.fired {
            return unchanged(answer, decision.reason);
        }
        let generator = match generator.get() {
            Some(g) => g,
            None => return unchanged(answer, DecisionReason::Offline),
        };

        let sources = prompts::join_evidence(evidence, self.source_chars);
        let prompt = prompts::regeneration_prompt(question, &analysis.low_support, &sources);
        match generator.complete(prompts::REGENERATION_SYSTEM_PROMPT, &prompt).await {
            Ok(regenerated) => RegenerationOutcome {
                answer: regenerated,
                regenerated: true,
                reason: DecisionReason::RegenTrigger,
                low_support_before: analysis.low_support.clone(),
            },
            Err(e) => {
                log::warn!("Regeneration failed, keeping baseline answer: {}", e);
                unchanged(answer, DecisionReason::GenerationFailed)
            }
        }
    }
}

fn unchanged(answer: &str, reason: DecisionReason) -> RegenerationOutcome {
    RegenerationOutcome {
        answer: answer.to_string(),
        regenerated: false,
        reason,
        low_support_before: Vec::new(),
    }
}
