//! Answer grounding checks and the decisions they drive.
//!
//! The analyzers here are pure (citations) or degrade to deterministic
//! results when a collaborator is offline (support scoring). Deciders return a
//! [`Decision`] so the orchestrator can record why a branch fired without
//! re-deriving the policy.

pub mod citations;
pub mod fallback;
pub mod regenerate;
pub mod support;

pub use citations::{CitationAnalyzer, CitationReport, CitationVerification};
pub use fallback::FallbackDecider;
pub use regenerate::{RegenerationDecider, RegenerationOutcome};
pub use support::{SupportAnalysis, SupportScorer};

use serde::Serialize;

/// Why a decider fired or held back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// Switched off in configuration.
    Disabled,
    /// Scoring or generation collaborator unavailable.
    Offline,
    /// No scored sentences to judge.
    NoSentences,
    /// Low-support share at or under the regeneration ratio.
    RatioOk,
    RegenTrigger,
    /// Regeneration was attempted but the generator returned an error.
    GenerationFailed,
    LowCitationCoverage,
    LowSupport,
    LowCoverageAndSupport,
    WithinTolerance,
}

/// Outcome of a decision step: whether it fired and why.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub fired: bool,
    pub reason: DecisionReason,
}

impl Decision {
    pub fn fire(reason: DecisionReason) -> Self {
        Self { fired: true, reason }
    }

    pub fn hold(reason: DecisionReason) -> Self {
        Self { fired: false, reason }
    }
}
