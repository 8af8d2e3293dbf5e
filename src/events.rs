//! Structured events emitted by the engine.
//!
//! The engine never prints. Everything a user should see is an [`EngineEvent`]
//! handed to an [`EventSink`]; the renderers in [`crate::report`] decide how it looks.

use serde::Serialize;

use crate::models::{LicenseType, PaymentMethod};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    LicenseAdded {
        payment_method: PaymentMethod,
        license_type: LicenseType,
    },
    LicenseRemoved {
        payment_method: PaymentMethod,
        license_type: LicenseType,
    },
    Inventory {
        total: usize,
        complimentary: usize,
    },
    ChunkFetched {
        index: usize,
        requested: usize,
        returned: usize,
    },
    AppProtected,
    PackageSkipped,
    Resolved {
        candidate_apps: usize,
        protected_apps: usize,
    },
    Cancelled,
    RemovalPlanned {
        total: usize,
    },
    AppRemoved,
    AppSkipped,
    AppFailed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineEvent {
    pub kind: EventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl EngineEvent {
    pub fn new(kind: EventKind) -> Self {
        EngineEvent {
            kind,
            app_id: None,
            package_id: None,
            detail: None,
        }
    }

    pub fn app(mut self, app_id: u32) -> Self {
        self.app_id = Some(app_id);
        self
    }

    pub fn package(mut self, package_id: u32) -> Self {
        self.package_id = Some(package_id);
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Receives engine events in emission order. Called from a single task.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

/// Sink that keeps every event, for assertions.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingSink {
    events: std::sync::Mutex<Vec<EngineEvent>>,
}

#[cfg(test)]
impl RecordingSink {
    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&EventKind) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| pred(&e.kind)).count()
    }
}

#[cfg(test)]
impl EventSink for RecordingSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_flat() {
        let event = EngineEvent::new(EventKind::AppFailed)
            .app(10)
            .package(1)
            .detail("AccessDenied");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"]["type"], "app_failed");
        assert_eq!(json["app_id"], 10);
        assert_eq!(json["package_id"], 1);
        assert_eq!(json["detail"], "AccessDenied");
    }

    #[test]
    fn test_absent_fields_are_omitted() {
        let json = serde_json::to_value(EngineEvent::new(EventKind::Cancelled)).unwrap();
        assert!(json.get("app_id").is_none());
        assert!(json.get("detail").is_none());
    }
}
