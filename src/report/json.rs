use crate::events::{EngineEvent, EventSink};
use crate::pipeline::PipelineOutcome;

/// One JSON object per event on stdout.
pub struct JsonSink;

impl EventSink for JsonSink {
    fn emit(&self, event: EngineEvent) {
        match serde_json::to_string(&event) {
            Ok(line) => println!("{}", line),
            Err(e) => tracing::error!(error = %e, "failed to serialize event"),
        }
    }
}

/// Final JSON object describing how the run ended.
pub fn outcome_json(outcome: &PipelineOutcome) -> serde_json::Value {
    match outcome {
        PipelineOutcome::NothingToRemove => serde_json::json!({"outcome": "nothing_to_remove"}),
        PipelineOutcome::Cancelled => serde_json::json!({"outcome": "cancelled"}),
        PipelineOutcome::Completed(summary) => serde_json::json!({
            "outcome": "completed",
            "removed": summary.removed,
            "skipped": summary.skipped,
            "failed": summary.failed,
        }),
    }
}
