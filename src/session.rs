use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::{EngineError, Result};
use crate::events::EventSink;
use crate::models::License;
use crate::pipeline::{Engine, PipelineOutcome};
use crate::snapshot::{diff, notify, LicenseSnapshot, SnapshotDiff};

/// Where the session stands with respect to license-list events.
#[derive(Debug, Default)]
pub enum SessionState {
    #[default]
    AwaitingBaseline,
    Steady { previous: LicenseSnapshot },
}

#[derive(Debug, PartialEq)]
pub enum Observation {
    /// First snapshot: stored as the baseline, never diffed.
    Baseline(LicenseSnapshot),
    Changed {
        changes: SnapshotDiff,
        previous: LicenseSnapshot,
    },
}

impl SessionState {
    /// Advance on a new snapshot. The current snapshot replaces the previous one wholesale.
    pub fn observe(&mut self, current: LicenseSnapshot) -> Observation {
        let next = SessionState::Steady {
            previous: current.clone(),
        };

        match std::mem::replace(self, next) {
            SessionState::AwaitingBaseline => Observation::Baseline(current),
            SessionState::Steady { previous } => Observation::Changed {
                changes: diff(&previous, &current),
                previous,
            },
        }
    }

    pub fn current(&self) -> Option<&LicenseSnapshot> {
        match self {
            SessionState::AwaitingBaseline => None,
            SessionState::Steady { previous } => Some(previous),
        }
    }
}

/// Apply one license-list event. Returns the baseline on the first event only.
fn advance(
    state: &mut SessionState,
    licenses: Vec<License>,
    sink: &dyn EventSink,
) -> Option<LicenseSnapshot> {
    match state.observe(LicenseSnapshot::from_licenses(licenses)) {
        Observation::Baseline(baseline) => Some(baseline),
        Observation::Changed { changes, previous } => {
            if let Some(current) = state.current() {
                notify(&changes, &previous, current, sink);
            }
            None
        }
    }
}

/// Consume license-list events until the one-time pipeline has finished.
///
/// The first event becomes the baseline and starts the pipeline on its own task.
/// Later events are diffed against their predecessor while the pipeline runs.
pub async fn run_session(
    mut feed: mpsc::Receiver<Vec<License>>,
    engine: Engine,
    sink: Arc<dyn EventSink>,
) -> Result<PipelineOutcome> {
    let mut state = SessionState::default();

    let baseline = loop {
        let licenses = feed.recv().await.ok_or(EngineError::FeedClosed)?;
        if let Some(baseline) = advance(&mut state, licenses, sink.as_ref()) {
            break baseline;
        }
    };

    tracing::info!(licenses = baseline.len(), "baseline license list received");
    let mut pipeline = tokio::spawn(async move { engine.run(&baseline).await });
    let mut feed_open = true;

    // Queued snapshots are diffed before the pipeline result is taken.
    loop {
        tokio::select! {
            biased;

            next = feed.recv(), if feed_open => match next {
                Some(licenses) => {
                    advance(&mut state, licenses, sink.as_ref());
                }
                None => {
                    tracing::debug!("license feed closed, waiting for pipeline");
                    feed_open = false;
                }
            },
            finished = &mut pipeline => {
                return finished.map_err(|e| EngineError::Task(e.to_string()))?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventKind, RecordingSink};
    use crate::models::{AccessToken, LicenseType, PaymentMethod, RemovalSummary};
    use crate::pipeline::EngineSettings;
    use crate::testing::{FakeAccount, FakeCatalog, FixedAnswer};
    use std::collections::BTreeSet;
    use tempfile::tempdir;

    fn license(package_id: u32, method: PaymentMethod) -> License {
        License {
            package_id,
            acquisition_method: method,
            grant_type: LicenseType::SinglePurchase,
            access_token: AccessToken(0),
        }
    }

    fn snapshot(ids: &[u32]) -> LicenseSnapshot {
        LicenseSnapshot::from_licenses(ids.iter().map(|id| license(*id, PaymentMethod::Wallet)))
    }

    #[test]
    fn test_first_snapshot_is_baseline() {
        let mut state = SessionState::default();
        assert!(state.current().is_none());

        let first = state.observe(snapshot(&[1, 2]));
        assert_eq!(first, Observation::Baseline(snapshot(&[1, 2])));

        match state.observe(snapshot(&[2, 3])) {
            Observation::Changed { changes, previous } => {
                assert_eq!(changes.added, BTreeSet::from([3]));
                assert_eq!(changes.removed, BTreeSet::from([1]));
                assert_eq!(previous, snapshot(&[1, 2]));
            }
            other => panic!("expected a diff, got {:?}", other),
        }
        assert_eq!(state.current(), Some(&snapshot(&[2, 3])));
    }

    #[test]
    fn test_only_first_transition_is_baseline() {
        let mut state = SessionState::default();
        state.observe(snapshot(&[1]));
        for _ in 0..3 {
            assert!(matches!(
                state.observe(snapshot(&[1])),
                Observation::Changed { ref changes, .. } if changes.is_empty()
            ));
        }
    }

    fn engine(
        sink: Arc<RecordingSink>,
        dir: &std::path::Path,
        answer: &'static str,
    ) -> (Engine, Arc<FakeAccount>) {
        let account = Arc::new(FakeAccount::new(5));
        let engine = Engine {
            catalog: Arc::new(FakeCatalog::default().with_package(1, &[10], 0, 1, 12)),
            account: account.clone(),
            gate: Arc::new(FixedAnswer::new(answer)),
            sink,
            settings: EngineSettings {
                chunk_size: 10,
                audit_dir: dir.to_path_buf(),
            },
        };
        (engine, account)
    }

    #[tokio::test]
    async fn test_session_runs_pipeline_once_and_diffs_later_events() {
        let dir = tempdir().unwrap();
        let sink = Arc::new(RecordingSink::default());
        let (engine, account) = engine(sink.clone(), dir.path(), "yes");

        let (tx, rx) = mpsc::channel(8);
        tx.send(vec![license(1, PaymentMethod::Complimentary)]).await.unwrap();
        tx.send(vec![license(2, PaymentMethod::Wallet)]).await.unwrap();
        drop(tx);

        let outcome = run_session(rx, engine, sink.clone()).await.unwrap();

        assert_eq!(
            outcome,
            PipelineOutcome::Completed(RemovalSummary {
                removed: 1,
                skipped: 0,
                failed: 0
            })
        );
        assert_eq!(account.revoked(), vec![10]);
        assert_eq!(sink.count(|k| matches!(k, EventKind::Inventory { .. })), 1);

        let changes: Vec<_> = sink
            .events()
            .into_iter()
            .filter(|e| {
                matches!(
                    e.kind,
                    EventKind::LicenseAdded { .. } | EventKind::LicenseRemoved { .. }
                )
            })
            .map(|e| e.package_id)
            .collect();
        assert_eq!(changes, vec![Some(2), Some(1)]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_queued_snapshot_diffed_after_quick_pipeline() {
        for _ in 0..50 {
            let dir = tempdir().unwrap();
            let sink = Arc::new(RecordingSink::default());
            let (engine, _) = engine(sink.clone(), dir.path(), "no");

            let (tx, rx) = mpsc::channel(2);
            tx.send(vec![license(1, PaymentMethod::Complimentary)]).await.unwrap();
            tx.send(vec![
                license(1, PaymentMethod::Complimentary),
                license(2, PaymentMethod::Wallet),
            ])
            .await
            .unwrap();

            let outcome = run_session(rx, engine, sink.clone()).await.unwrap();
            assert_eq!(outcome, PipelineOutcome::Cancelled);
            assert_eq!(
                sink.count(|k| matches!(k, EventKind::LicenseAdded { .. })),
                1
            );
            drop(tx);
        }
    }

    #[tokio::test]
    async fn test_feed_closed_before_baseline() {
        let dir = tempdir().unwrap();
        let sink = Arc::new(RecordingSink::default());
        let (engine, _) = engine(sink.clone(), dir.path(), "yes");

        let (tx, rx) = mpsc::channel::<Vec<License>>(1);
        drop(tx);

        let err = run_session(rx, engine, sink).await.unwrap_err();
        assert!(matches!(err, EngineError::FeedClosed));
    }

    #[tokio::test]
    async fn test_declined_session_ends_cleanly() {
        let dir = tempdir().unwrap();
        let sink = Arc::new(RecordingSink::default());
        let (engine, account) = engine(sink.clone(), dir.path(), "nope");

        let (tx, rx) = mpsc::channel(1);
        tx.send(vec![license(1, PaymentMethod::Complimentary)]).await.unwrap();

        let outcome = run_session(rx, engine, sink).await.unwrap();
        assert_eq!(outcome, PipelineOutcome::Cancelled);
        assert!(account.revoked().is_empty());
        drop(tx);
    }
}
