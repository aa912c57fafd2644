//! Append-only audit trail for pipeline runs.
//!
//! Sinks are injected into the orchestrator; each run wraps its sink in a
//! [`RunAudit`] so every event carries the run id. Sinks never fail the
//! caller: storage errors are logged and dropped.

pub mod metrics;
pub mod sqlite;

pub use metrics::AuditMetrics;
pub use sqlite::SqliteAuditLog;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// Event names emitted by the orchestrator, in pipeline order.
pub mod events {
    pub const RETRIEVAL: &str = "retrieval";
    pub const BASELINE_ANSWER: &str = "baseline_answer";
    pub const CITATION_CHECK: &str = "citation_check";
    pub const SUPPORT_ANALYSIS: &str = "support_analysis";
    pub const REGENERATION: &str = "regeneration";
    pub const FALLBACK: &str = "fallback";
    pub const RUN_COMPLETE: &str = "orchestrator_complete";
    /// Graph mode only; follows `retrieval` when the question was rewritten.
    pub const GRAPH_REPHRASE: &str = "graph_rephrase";
    /// Graph mode only; follows `retrieval`.
    pub const GRAPH_COMPLETENESS: &str = "graph_completeness";
}

/// One stored audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub ts: DateTime<Utc>,
    pub event: String,
    pub payload: Value,
}

impl AuditEvent {
    pub fn run_id(&self) -> Option<&str> {
        self.payload.get("run_id").and_then(Value::as_str)
    }
}

/// Fire-and-forget, append-only event sink.
///
/// Each call must store one complete record; concurrent callers must not
/// interleave fields of different records.
pub trait AuditSink: Send + Sync {
    fn log(&self, event: &str, payload: &Value);
}

/// In-process sink, mainly for tests and single-session use.
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events in append order.
    pub fn events(&self) -> Vec<AuditEvent> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl AuditSink for MemoryAuditLog {
    fn log(&self, event: &str, payload: &Value) {
        let record = AuditEvent {
            ts: Utc::now(),
            event: event.to_string(),
            payload: payload.clone(),
        };
        match self.events.lock() {
            Ok(mut guard) => guard.push(record),
            Err(poisoned) => poisoned.into_inner().push(record),
        }
    }
}

/// A sink bound to one pipeline run; stamps `run_id` into every payload.
#[derive(Clone)]
pub struct RunAudit {
    run_id: String,
    sink: Arc<dyn AuditSink>,
}

impl RunAudit {
    pub fn new(run_id: impl Into<String>, sink: Arc<dyn AuditSink>) -> Self {
        Self {
            run_id: run_id.into(),
            sink,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Object payloads gain a `run_id` key; anything else is nested under `data`.
    pub fn log(&self, event: &str, payload: Value) {
        let payload = match payload {
            Value::Object(mut map) => {
                map.insert("run_id".to_string(), Value::String(self.run_id.clone()));
                Value::Object(map)
            }
            other => json!({ "run_id": self.run_id, "data": other }),
        };
        self.sink.log(event, &payload);
    }
}
