//! Unified event bus: trait for emitting workflow lifecycle events from
//! any module.
//!
//! Modules accept an `Arc<dyn EventSink>` to emit run and stage events
//! toward whatever observability pipeline the host wires up.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Lifecycle event kinds emitted by the workflow engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowEventType {
    RunSubmitted,
    StageStarted,
    StageCompleted,
    StageFailed,
    RunCompleted,
    RunFailed,
    RunRejected,
    RunCancelled,
}

/// A single workflow lifecycle event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowEvent {
    pub event_id: Uuid,
    pub event_type: WorkflowEventType,
    pub run_id: Uuid,
    pub stage: Option<String>,
    pub detail: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Trait for emitting workflow events. Implementations route events to
/// logs, message buses, or test captures.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: WorkflowEvent);
}

/// No-op sink for tests and modules that don't need event emission.
pub struct NoOpSink;

impl EventSink for NoOpSink {
    fn emit(&self, _event: WorkflowEvent) {}
}

/// In-memory sink that captures events for testing.
#[derive(Default)]
pub struct CaptureSink {
    events: Mutex<Vec<WorkflowEvent>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<WorkflowEvent> {
        self.events.lock().expect("event bus mutex poisoned").clone()
    }

    pub fn count(&self) -> usize {
        self.events.lock().expect("event bus mutex poisoned").len()
    }

    pub fn count_type(&self, event_type: WorkflowEventType) -> usize {
        self.events
            .lock()
            .expect("event bus mutex poisoned")
            .iter()
            .filter(|e| e.event_type == event_type)
            .count()
    }
}

impl EventSink for CaptureSink {
    fn emit(&self, event: WorkflowEvent) {
        self.events.lock().expect("event bus mutex poisoned").push(event);
    }
}

/// Convenience builder for creating a `WorkflowEvent` with minimal
/// boilerplate.
pub fn make_event(
    event_type: WorkflowEventType,
    run_id: Uuid,
    stage: Option<String>,
    detail: Option<String>,
) -> WorkflowEvent {
    WorkflowEvent {
        event_id: Uuid::new_v4(),
        event_type,
        run_id,
        stage,
        detail,
        timestamp: Utc::now(),
    }
}

/// Convenience: create a no-op event bus for modules that don't need it.
pub fn noop_sink() -> Arc<dyn EventSink> {
    Arc::new(NoOpSink)
}

/// Convenience: create a capture sink for tests.
pub fn capture_sink() -> Arc<CaptureSink> {
    Arc::new(CaptureSink::new())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_sink() {
        let sink = capture_sink();
        assert_eq!(sink.count(), 0);

        let run_id = Uuid::new_v4();
        sink.emit(make_event(
            WorkflowEventType::RunSubmitted,
            run_id,
            None,
            None,
        ));
        sink.emit(make_event(
            WorkflowEventType::StageStarted,
            run_id,
            Some("generate".into()),
            None,
        ));

        assert_eq!(sink.count(), 2);
        assert_eq!(sink.count_type(WorkflowEventType::RunSubmitted), 1);
        assert_eq!(sink.count_type(WorkflowEventType::StageStarted), 1);

        let events = sink.events();
        assert_eq!(events[0].run_id, run_id);
        assert_eq!(events[1].stage.as_deref(), Some("generate"));
    }

    #[test]
    fn test_noop_sink() {
        let sink = noop_sink();
        // Should not panic
        sink.emit(make_event(
            WorkflowEventType::RunCompleted,
            Uuid::new_v4(),
            None,
            None,
        ));
    }
}
