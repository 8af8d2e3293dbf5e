use std::collections::BTreeSet;

use crate::account::AccountService;
use crate::audit::AuditLog;
use crate::error::Result;
use crate::events::{EngineEvent, EventKind, EventSink};
use crate::models::{RemovalOutcome, RemovalRecord, RemovalSummary};
use crate::resolver::{ProtectionSet, RemovableMap};

pub const PAID_COVERAGE_REASON: &str = "covered by a paid license";

/// Flatten the removable map into `(app_id, first_package_id)` pairs.
///
/// Each app appears once, attributed to the first package it was seen under.
pub fn removal_order(removable: &RemovableMap) -> Vec<(u32, u32)> {
    let mut seen = BTreeSet::new();
    let mut order = Vec::new();

    for (package_id, app_ids) in removable {
        for app_id in app_ids {
            if seen.insert(*app_id) {
                order.push((*app_id, *package_id));
            }
        }
    }

    order
}

/// Revokes removable apps one at a time, logging every outcome.
pub struct RemovalExecutor<'a> {
    account: &'a dyn AccountService,
    audit: &'a mut AuditLog,
    sink: &'a dyn EventSink,
}

impl<'a> RemovalExecutor<'a> {
    pub fn new(
        account: &'a dyn AccountService,
        audit: &'a mut AuditLog,
        sink: &'a dyn EventSink,
    ) -> Self {
        RemovalExecutor {
            account,
            audit,
            sink,
        }
    }

    /// Process every removable app in order. Only audit log failures abort.
    pub async fn execute(
        &mut self,
        removable: &RemovableMap,
        protected: &ProtectionSet,
    ) -> Result<RemovalSummary> {
        let order = removal_order(removable);
        let mut summary = RemovalSummary::default();

        self.sink
            .emit(EngineEvent::new(EventKind::RemovalPlanned { total: order.len() }));

        for (app_id, package_id) in order {
            let record = if protected.contains(app_id) {
                RemovalRecord {
                    app_id,
                    package_id,
                    outcome: RemovalOutcome::Skipped,
                    detail: Some(PAID_COVERAGE_REASON.to_string()),
                }
            } else {
                self.revoke(app_id, package_id).await
            };

            self.audit.record(&record)?;
            summary.tally(record.outcome);
            self.sink.emit(event_for(&record));
        }

        self.audit.summary(&summary)?;
        tracing::info!(
            removed = summary.removed,
            skipped = summary.skipped,
            failed = summary.failed,
            "removal finished"
        );

        Ok(summary)
    }

    async fn revoke(&self, app_id: u32, package_id: u32) -> RemovalRecord {
        let (outcome, detail) = match self.account.revoke(app_id).await {
            Ok(code) if code.is_ok() => (RemovalOutcome::Removed, None),
            Ok(code) => {
                tracing::warn!(app_id, result = %code, "revoke rejected");
                (RemovalOutcome::Failed, Some(code.to_string()))
            }
            Err(e) => {
                let message = format!("{:#}", e);
                tracing::warn!(app_id, error = %message, "revoke call failed");
                (RemovalOutcome::Failed, Some(message))
            }
        };

        RemovalRecord {
            app_id,
            package_id,
            outcome,
            detail,
        }
    }
}

fn event_for(record: &RemovalRecord) -> EngineEvent {
    let kind = match record.outcome {
        RemovalOutcome::Removed => EventKind::AppRemoved,
        RemovalOutcome::Skipped => EventKind::AppSkipped,
        RemovalOutcome::Failed => EventKind::AppFailed,
    };

    let event = EngineEvent::new(kind)
        .app(record.app_id)
        .package(record.package_id);

    match &record.detail {
        Some(detail) => event.detail(detail.clone()),
        None => event,
    }
}
