//! Prompt text for baseline answering, regeneration and fallback summaries,
//! plus the deterministic offline renderings used when no generator is
//! configured.

use crate::retrieve::EvidenceChunk;
use crate::text::prefix_chars;

pub const ANSWER_SYSTEM_PROMPT: &str = "You are a privacy assistant. Answer strictly based on the GDPR. \
Cite Articles/Recitals and page numbers. If uncertain, say so and do not fabricate citations.";

pub const REGENERATION_SYSTEM_PROMPT: &str = "You are a GDPR assistant. Regenerate a grounded answer to the \
user's question using ONLY the provided source excerpts. Cite Articles/Recitals/pages. If unsure, say so.";

pub const SUMMARY_SYSTEM_PROMPT: &str = "You are a GDPR assistant. Use ONLY provided text, cite Articles or pages.";

pub const OFFLINE_ANSWER_PREFIX: &str = "[Offline Mode] Cannot access OpenAI API. Retrieved context:\n";

pub const OFFLINE_SUMMARY_PREFIX: &str = "[Offline summarizer] API key missing; using truncated context.\n";

/// Render evidence as `[p.<page>] <header> :: <snippet>` blocks.
pub fn format_evidence(evidence: &[EvidenceChunk], max_chars: usize) -> String {
    evidence
        .iter()
        .map(|chunk| {
            let page = chunk.page.map(|p| p.to_string()).unwrap_or_else(|| "?".to_string());
            let header = chunk.section_header.as_deref().unwrap_or("");
            let snippet = prefix_chars(&chunk.text, max_chars).replace('\n', " ");
            format!("[p.{}] {} :: {}", page, header, snippet)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Concatenate raw evidence prefixes separated by blank lines.
pub fn join_evidence(evidence: &[EvidenceChunk], max_chars: usize) -> String {
    evidence
        .iter()
        .map(|chunk| prefix_chars(&chunk.text, max_chars))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn answer_prompt(question: &str, context_block: &str) -> String {
    format!(
        "Question: {}\n\nContext:\n{}\n\nRespond concisely and cite sources.",
        question, context_block
    )
}

/// Answer substituted for generation when the generator is offline. Built
/// purely from evidence text so it is reproducible.
pub fn offline_answer(evidence: &[EvidenceChunk], max_chars: usize) -> String {
    format!("{}{}", OFFLINE_ANSWER_PREFIX, format_evidence(evidence, max_chars))
}

pub fn regeneration_prompt(question: &str, low_support: &[String], sources: &str) -> String {
    let flagged = low_support
        .iter()
        .map(|s| format!("- {}", s))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Focus on correcting the following low-support sentences (they lacked source similarity):\n{}\n\
         Question: {}\nSources:\n{}\nGrounded Answer:",
        flagged, question, sources
    )
}

pub fn summary_prompt(question: &str, sources: &str) -> String {
    format!("Question: {}\n\nText:\n{}\n\nAnswer with citations:", question, sources)
}

/// Fallback summary used when the generator is offline or fails.
pub fn offline_summary(sources: &str, max_chars: usize) -> String {
    format!("{}{}", OFFLINE_SUMMARY_PREFIX, prefix_chars(sources, max_chars))
}
