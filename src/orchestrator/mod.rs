//! The verification pipeline: retrieval, baseline answer, citation and
//! support checks, optional regeneration, optional fallback, diagnostics.
//!
//! States run strictly in order and each appends one [`StepRecord`] and one
//! audit event. Graph retrieval adds its `graph_rephrase` and
//! `graph_completeness` events right after `retrieval`. No collaborator
//! failure aborts a run; every run returns an answer and diagnostics.

mod diagnostics;
mod steps;

pub use diagnostics::Diagnostics;
pub use steps::StepRecord;

use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::audit::{events, AuditSink, RunAudit};
use crate::availability::Availability;
use crate::config::PipelineConfig;
use crate::embeddings::Embedder;
use crate::graph::GraphReport;
use crate::grounding::{
    CitationAnalyzer, Decision, DecisionReason, FallbackDecider, RegenerationDecider, RegenerationOutcome, SupportScorer,
};
use crate::llm::{prompts, Generator};
use crate::retrieve::{EvidenceChunk, Retrieval, Retriever};
use crate::text::prefix_chars;

/// Everything one run produced. Fully built before it is returned.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub run_id: String,
    pub answer: String,
    pub steps: Vec<StepRecord>,
    pub diagnostics: Diagnostics,
    /// Present when evidence came through the structural graph.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph: Option<GraphReport>,
}

impl RunOutcome {
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(StepRecord::name).collect()
    }
}

pub struct Orchestrator<R, E, G> {
    retriever: R,
    embedder: Availability<E>,
    generator: Availability<G>,
    audit: Arc<dyn AuditSink>,
    config: PipelineConfig,
}

/// Step list and audit trail of one run, kept in lockstep.
struct RunLog {
    audit: RunAudit,
    steps: Vec<StepRecord>,
}

impl RunLog {
    fn record(&mut self, step: StepRecord, extra: Value) {
        let mut payload = serde_json::to_value(&step).unwrap_or_else(|_| json!({ "name": step.name() }));
        if let (Value::Object(map), Value::Object(extra)) = (&mut payload, extra) {
            map.extend(extra);
        }
        log::debug!("[{}] {}", self.audit.run_id(), payload);
        self.audit.log(step.event(), payload);
        self.steps.push(step);
    }
}

impl<R, E, G> Orchestrator<R, E, G>
where
    R: Retriever,
    E: Embedder,
    G: Generator,
{
    pub fn new(
        retriever: R,
        embedder: Availability<E>,
        generator: Availability<G>,
        audit: Arc<dyn AuditSink>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            retriever,
            embedder,
            generator,
            audit,
            config,
        }
    }

    /// Answer `question` and verify the answer against its evidence.
    pub async fn run(&self, question: &str) -> RunOutcome {
        let run_id = Uuid::new_v4().to_string();
        let cfg = &self.config;
        let mut run = RunLog {
            audit: RunAudit::new(run_id.clone(), self.audit.clone()),
            steps: Vec::with_capacity(7),
        };
        log::info!("Run {} started (k={})", run_id, cfg.k_retrieval);

        // Retrieval
        let Retrieval { chunks: evidence, graph } = match self.retriever.retrieve_evidence(question, cfg.k_retrieval).await {
            Ok(retrieval) => retrieval,
            Err(e) => {
                log::warn!("Retrieval failed, continuing without evidence: {}", e);
                Retrieval::default()
            }
        };
        let pages: Vec<Option<u32>> = evidence.iter().map(|c| c.page).collect();
        run.record(
            StepRecord::Retrieval {
                k: cfg.k_retrieval,
                retrieved: evidence.len(),
            },
            json!({ "pages": pages }),
        );
        if let Some(report) = &graph {
            if report.rephrased() {
                run.audit.log(events::GRAPH_REPHRASE, report.rephrase_event());
            }
            run.audit.log(events::GRAPH_COMPLETENESS, report.completeness_event());
        }

        // Baseline answer
        let (mut answer, offline) = self.baseline_answer(question, &evidence).await;
        run.record(
            StepRecord::BaselineAnswer {
                chars: answer.chars().count(),
                offline,
            },
            json!({}),
        );

        // Citation check
        let analyzer = CitationAnalyzer::new(cfg.citation_min_coverage);
        let citations = analyzer.coverage(&answer);
        let verification = analyzer.verify(&answer, &citation_context(&evidence, cfg.citation_context_chars));
        run.record(
            StepRecord::CitationCheck {
                citations: citations.citations.len(),
                sentence_count: citations.sentence_count,
                coverage: citations.coverage,
                low: citations.low,
                missing_citations: verification.missing.clone(),
            },
            json!({ "citation_list": citations.citations, "cited": verification.cited }),
        );

        // Support analysis
        let scorer = SupportScorer::new(cfg.support_threshold, cfg.support_chunk_chars, cfg.min_sentence_chars);
        let analysis = scorer.score(&answer, &evidence, &self.embedder).await;
        run.record(
            StepRecord::SupportAnalysis {
                sentences: analysis.sentences.len(),
                low_support_count: analysis.low_support_count(),
                threshold: analysis.threshold,
                offline: analysis.offline,
            },
            json!({}),
        );

        // Regeneration: replaces the working answer when it fires.
        let regeneration = if cfg.enable_regeneration {
            RegenerationDecider::new(cfg.regen_ratio, cfg.regen_source_chars)
                .regenerate(question, &answer, &evidence, &analysis, &self.generator)
                .await
        } else {
            RegenerationOutcome {
                answer: answer.clone(),
                regenerated: false,
                reason: DecisionReason::Disabled,
                low_support_before: Vec::new(),
            }
        };
        if regeneration.regenerated {
            answer = regeneration.answer;
        }
        run.record(
            StepRecord::Regeneration {
                regenerated: regeneration.regenerated,
                reason: regeneration.reason,
            },
            json!({ "low_support_before": regeneration.low_support_before }),
        );

        // Fallback: appends to the working answer when it fires.
        let decider = FallbackDecider::new(cfg.regen_ratio, cfg.summary_source_chars, cfg.offline_summary_chars);
        let decision = if cfg.enable_fallback {
            decider.decide(&citations, &analysis)
        } else {
            Decision::hold(DecisionReason::Disabled)
        };
        let mut summary_chars = 0;
        if decision.fired {
            let summary = decider.summarize(question, &evidence, &self.generator).await;
            summary_chars = summary.chars().count();
            answer = FallbackDecider::merge(&answer, &summary);
        }
        run.record(
            StepRecord::Fallback {
                fallback_used: decision.fired,
                reason: decision.reason,
                chars: summary_chars,
            },
            json!({ "low_support_ratio": analysis.low_support_ratio() }),
        );

        // Finalize
        let diagnostics = Diagnostics {
            citation_coverage: citations.coverage,
            citations: citations.citations.len(),
            citation_list: citations.citations.clone(),
            missing_citations: verification.missing.clone(),
            low_support_count: analysis.low_support_count(),
            fallback_used: decision.fired,
            regenerated: regeneration.regenerated,
        };
        if cfg.append_diagnostics_footer {
            answer.push('\n');
            answer.push_str(&diagnostics.footer(analysis.threshold));
            if let Some(report) = &graph {
                answer.push('\n');
                answer.push_str(&report.footer());
            }
        }
        let mut terminal = serde_json::to_value(&diagnostics).unwrap_or_else(|_| json!({}));
        if let Value::Object(map) = &mut terminal {
            map.insert(
                "answer_preview".to_string(),
                Value::String(prefix_chars(&answer, cfg.answer_preview_chars).to_string()),
            );
        }
        run.record(
            StepRecord::Finalize {
                answer_chars: answer.chars().count(),
                footer: cfg.append_diagnostics_footer,
            },
            terminal,
        );

        log::info!(
            "Run {} finished: coverage={:.2} low_support={} regenerated={} fallback={}",
            run_id,
            diagnostics.citation_coverage,
            diagnostics.low_support_count,
            diagnostics.regenerated,
            diagnostics.fallback_used
        );

        RunOutcome {
            run_id,
            answer,
            steps: run.steps,
            diagnostics,
            graph,
        }
    }

    /// Generated answer, or the offline context dump when the generator is
    /// unavailable or fails. The flag is true for the dump.
    async fn baseline_answer(&self, question: &str, evidence: &[EvidenceChunk]) -> (String, bool) {
        let max_chars = self.config.baseline_context_chars;
        let generator = match self.generator.get() {
            Some(g) => g,
            None => return (prompts::offline_answer(evidence, max_chars), true),
        };

        let prompt = prompts::answer_prompt(question, &prompts::format_evidence(evidence, max_chars));
        match generator.complete(prompts::ANSWER_SYSTEM_PROMPT, &prompt).await {
            Ok(answer) => (answer, false),
            Err(e) => {
                log::warn!("Baseline generation failed, using offline context: {}", e);
                (prompts::offline_answer(evidence, max_chars), true)
            }
        }
    }
}

/// Context for citation cross-verification: chunk prefixes, one per line.
fn citation_context(evidence: &[EvidenceChunk], max_chars: usize) -> String {
    evidence
        .iter()
        .map(|c| prefix_chars(&c.text, max_chars))
        .collect::<Vec<_>>()
        .join("\n")
}
