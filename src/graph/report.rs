//! What a graph retrieval covered, for the audit trail and the answer footer.

use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

use super::{SemanticCoverage, StructuralCompleteness};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphReport {
    /// Question as asked, trimmed.
    pub original: String,
    /// Query sent to the anchor retriever.
    pub query: String,
    pub anchors: usize,
    pub expanded_nodes: usize,
    pub full_pages: bool,
    pub structural: StructuralCompleteness,
    pub semantic: SemanticCoverage,
}

impl GraphReport {
    pub fn rephrased(&self) -> bool {
        self.original != self.query
    }

    /// `graph_rephrase` payload.
    pub fn rephrase_event(&self) -> Value {
        json!({ "original": self.original, "rephrased": self.query })
    }

    /// `graph_completeness` payload: the structural report with the
    /// semantic coverage nested under `semantic`.
    pub fn completeness_event(&self) -> Value {
        let mut payload = serde_json::to_value(&self.structural).unwrap_or_else(|_| json!({}));
        if let Value::Object(map) = &mut payload {
            map.insert("expanded_nodes".to_string(), json!(self.expanded_nodes));
            map.insert(
                "semantic".to_string(),
                serde_json::to_value(&self.semantic).unwrap_or(Value::Null),
            );
        }
        payload
    }

    /// `[graph-mode] expanded_nodes=7 articles_found=3 recitals_found=1 full_page=0`,
    /// followed by `semantic_complete=0 missing_topics={"lawful basis":[9]}`
    /// when the question names a known topic.
    pub fn footer(&self) -> String {
        let mut line = format!(
            "[graph-mode] expanded_nodes={} articles_found={} recitals_found={} full_page={}",
            self.expanded_nodes,
            self.structural.articles_found,
            self.structural.recitals_found,
            u8::from(self.full_pages)
        );
        if !self.semantic.topics.is_empty() {
            let per_topic: BTreeMap<&str, &[u32]> = self
                .semantic
                .topics
                .iter()
                .map(|t| (t.as_str(), self.semantic.missing.get(t).map(Vec::as_slice).unwrap_or(&[])))
                .collect();
            let missing = serde_json::to_string(&per_topic).unwrap_or_else(|_| "{}".to_string());
            line.push_str(&format!(
                " semantic_complete={} missing_topics={}",
                u8::from(self.semantic.complete),
                missing
            ));
        }
        line
    }
}
