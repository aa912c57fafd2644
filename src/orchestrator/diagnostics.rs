//! Run diagnostics and the user-visible footer.

use serde::Serialize;

/// Fixed summary record handed to programmatic consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostics {
    pub citation_coverage: f64,
    pub citations: usize,
    pub citation_list: Vec<String>,
    pub missing_citations: Vec<u32>,
    pub low_support_count: usize,
    pub fallback_used: bool,
    pub regenerated: bool,
}

impl Diagnostics {
    /// One-line footer, e.g.
    /// `[agent-orchestrator] citations=2 coverage=0.67 low_support=1 regen=0 fallback=0`.
    /// The support threshold is appended when the fallback fired.
    pub fn footer(&self, support_threshold: f64) -> String {
        let mut parts = vec![
            "[agent-orchestrator]".to_string(),
            format!("citations={}", self.citations),
            format!("coverage={:.2}", self.citation_coverage),
            format!("low_support={}", self.low_support_count),
            format!("regen={}", u8::from(self.regenerated)),
            format!("fallback={}", u8::from(self.fallback_used)),
        ];
        if self.fallback_used {
            parts.push(format!("support_threshold={}", support_threshold));
        }
        parts.join(" ")
    }
}
