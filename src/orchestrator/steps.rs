//! Per-state step records.

use serde::Serialize;

use crate::audit::events;
use crate::grounding::DecisionReason;

/// One record per orchestrator state, in state order. Serialized with a
/// `name` tag so consumers can match on it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum StepRecord {
    Retrieval {
        k: usize,
        retrieved: usize,
    },
    BaselineAnswer {
        /// Length of the answer in characters; the content is not recorded.
        chars: usize,
        /// The deterministic context dump stood in for generation.
        offline: bool,
    },
    CitationCheck {
        citations: usize,
        sentence_count: usize,
        coverage: f64,
        low: bool,
        missing_citations: Vec<u32>,
    },
    SupportAnalysis {
        sentences: usize,
        low_support_count: usize,
        threshold: f64,
        offline: bool,
    },
    Regeneration {
        regenerated: bool,
        reason: DecisionReason,
    },
    Fallback {
        fallback_used: bool,
        reason: DecisionReason,
        /// Length of the appended summary; 0 when nothing was appended.
        chars: usize,
    },
    Finalize {
        answer_chars: usize,
        footer: bool,
    },
}

impl StepRecord {
    pub fn name(&self) -> &'static str {
        match self {
            StepRecord::Retrieval { .. } => "retrieval",
            StepRecord::BaselineAnswer { .. } => "baseline_answer",
            StepRecord::CitationCheck { .. } => "citation_check",
            StepRecord::SupportAnalysis { .. } => "support_analysis",
            StepRecord::Regeneration { .. } => "regeneration",
            StepRecord::Fallback { .. } => "fallback",
            StepRecord::Finalize { .. } => "finalize",
        }
    }

    /// Audit event emitted for this state.
    pub fn event(&self) -> &'static str {
        match self {
            StepRecord::Retrieval { .. } => events::RETRIEVAL,
            StepRecord::BaselineAnswer { .. } => events::BASELINE_ANSWER,
            StepRecord::CitationCheck { .. } => events::CITATION_CHECK,
            StepRecord::SupportAnalysis { .. } => events::SUPPORT_ANALYSIS,
            StepRecord::Regeneration { .. } => events::REGENERATION,
            StepRecord::Fallback { .. } => events::FALLBACK,
            StepRecord::Finalize { .. } => events::RUN_COMPLETE,
        }
    }
}
