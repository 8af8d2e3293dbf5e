use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use futures::TryStreamExt;

use crate::account::{AccountService, ConfirmationGate};
use crate::audit::AuditLog;
use crate::catalog::{fetch_all, CatalogService};
use crate::error::{EngineError, Result};
use crate::events::{EngineEvent, EventKind, EventSink};
use crate::executor::RemovalExecutor;
use crate::license::classifier::classify;
use crate::license::record::parse_metadata;
use crate::models::{PackageRequest, RemovalSummary};
use crate::resolver::{Absorbed, Resolution, Resolver};
use crate::snapshot::LicenseSnapshot;

pub const CONFIRM_PROMPT: &str =
    "Are you sure you want to remove complimentary licenses? Type 'yes' to confirm: ";

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    /// The baseline held no complimentary licenses.
    NothingToRemove,
    /// The user declined; nothing was revoked and no audit log was opened.
    Cancelled,
    Completed(RemovalSummary),
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub chunk_size: usize,
    pub audit_dir: PathBuf,
}

/// The one-shot reconcile-and-remove pipeline plus its collaborators.
#[derive(Clone)]
pub struct Engine {
    pub catalog: Arc<dyn CatalogService>,
    pub account: Arc<dyn AccountService>,
    pub gate: Arc<dyn ConfirmationGate>,
    pub sink: Arc<dyn EventSink>,
    pub settings: EngineSettings,
}

impl Engine {
    /// Run fetch → classify → resolve → confirm → remove against the baseline snapshot.
    pub async fn run(&self, baseline: &LicenseSnapshot) -> Result<PipelineOutcome> {
        let licenses = baseline.sorted();
        let requests: Vec<PackageRequest> = licenses.iter().map(|l| PackageRequest::from(*l)).collect();
        let complimentary: HashSet<u32> = licenses
            .iter()
            .filter(|l| l.is_complimentary_candidate())
            .map(|l| l.package_id)
            .collect();

        tracing::info!(
            total = requests.len(),
            complimentary = complimentary.len(),
            "license inventory"
        );
        self.sink.emit(EngineEvent::new(EventKind::Inventory {
            total: requests.len(),
            complimentary: complimentary.len(),
        }));

        if complimentary.is_empty() {
            return Ok(PipelineOutcome::NothingToRemove);
        }

        let resolution = self.reconcile(&requests, &complimentary).await?;

        self.sink.emit(EngineEvent::new(EventKind::Resolved {
            candidate_apps: resolution.candidate_apps(),
            protected_apps: resolution.protected.len(),
        }));

        if !self
            .gate
            .confirm(CONFIRM_PROMPT)
            .await
            .map_err(EngineError::Prompt)?
        {
            tracing::info!("removal declined");
            self.sink.emit(EngineEvent::new(EventKind::Cancelled));
            return Ok(PipelineOutcome::Cancelled);
        }

        let mut audit = AuditLog::open(&self.settings.audit_dir, self.account.account_id())?;
        tracing::info!(path = %audit.path().display(), "audit log opened");

        let summary = RemovalExecutor::new(self.account.as_ref(), &mut audit, self.sink.as_ref())
            .execute(&resolution.removable, &resolution.protected)
            .await?;

        Ok(PipelineOutcome::Completed(summary))
    }

    /// Fetch metadata chunk by chunk, classifying and resolving each package as it arrives.
    async fn reconcile(
        &self,
        requests: &[PackageRequest],
        complimentary: &HashSet<u32>,
    ) -> Result<Resolution> {
        let mut resolver = Resolver::new();
        let mut batches = std::pin::pin!(fetch_all(
            self.catalog.as_ref(),
            requests,
            self.settings.chunk_size
        ));

        while let Some(batch) = batches.try_next().await? {
            self.sink.emit(EngineEvent::new(EventKind::ChunkFetched {
                index: batch.index,
                requested: batch.requested,
                returned: batch.records.len(),
            }));

            for record in &batch.records {
                let pkg = parse_metadata(record)?;
                let classification = classify(&pkg, complimentary.contains(&pkg.package_id));

                match resolver.absorb(pkg.package_id, classification, &pkg.app_ids) {
                    Absorbed::Protected(fresh) => {
                        let reason = classification.reason(pkg.package_id);
                        for app_id in fresh {
                            self.sink.emit(
                                EngineEvent::new(EventKind::AppProtected)
                                    .app(app_id)
                                    .package(pkg.package_id)
                                    .detail(reason.clone()),
                            );
                        }
                    }
                    Absorbed::Skipped => {
                        self.sink.emit(
                            EngineEvent::new(EventKind::PackageSkipped)
                                .package(pkg.package_id)
                                .detail(classification.reason(pkg.package_id)),
                        );
                    }
                    Absorbed::Candidate => {}
                }
            }
        }

        Ok(resolver.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::log_path;
    use crate::events::RecordingSink;
    use crate::license::record::RawPackageRecord;
    use crate::models::{AccessToken, License, LicenseType, PaymentMethod};
    use crate::testing::{FakeAccount, FakeCatalog, FixedAnswer};
    use tempfile::{tempdir, TempDir};

    const AVAILABLE: u32 = 0;
    const SINGLE_PURCHASE: u32 = 1;
    const FREE_ON_DEMAND: u32 = 12;

    fn license(package_id: u32, method: PaymentMethod) -> License {
        License {
            package_id,
            acquisition_method: method,
            grant_type: LicenseType::SinglePurchase,
            access_token: AccessToken(1),
        }
    }

    struct Harness {
        engine: Engine,
        account: Arc<FakeAccount>,
        gate: Arc<FixedAnswer>,
        sink: Arc<RecordingSink>,
        dir: TempDir,
    }

    fn harness(catalog: FakeCatalog, answer: &'static str) -> Harness {
        let dir = tempdir().unwrap();
        let account = Arc::new(FakeAccount::new(99));
        let gate = Arc::new(FixedAnswer::new(answer));
        let sink = Arc::new(RecordingSink::default());
        let engine = Engine {
            catalog: Arc::new(catalog),
            account: account.clone(),
            gate: gate.clone(),
            sink: sink.clone(),
            settings: EngineSettings {
                chunk_size: 5000,
                audit_dir: dir.path().to_path_buf(),
            },
        };
        Harness {
            engine,
            account,
            gate,
            sink,
            dir,
        }
    }

    fn paid_and_free_catalog() -> FakeCatalog {
        FakeCatalog::default()
            .with_package(1, &[10, 11], AVAILABLE, SINGLE_PURCHASE, FREE_ON_DEMAND)
            .with_package(2, &[11, 12], AVAILABLE, SINGLE_PURCHASE, 1)
    }

    fn paid_and_free_snapshot() -> LicenseSnapshot {
        LicenseSnapshot::from_licenses([
            license(1, PaymentMethod::Complimentary),
            license(2, PaymentMethod::CreditCard),
        ])
    }

    #[tokio::test]
    async fn test_paid_overlap_scenario() {
        let h = harness(paid_and_free_catalog(), "yes");

        let outcome = h.engine.run(&paid_and_free_snapshot()).await.unwrap();

        assert_eq!(
            outcome,
            PipelineOutcome::Completed(RemovalSummary {
                removed: 1,
                skipped: 1,
                failed: 0
            })
        );
        assert_eq!(h.account.revoked(), vec![10]);
        assert_eq!(
            h.sink.count(|k| *k == EventKind::AppProtected),
            2,
            "apps 11 and 12 protected once each"
        );
        assert!(h.sink.events().contains(&EngineEvent::new(EventKind::Resolved {
            candidate_apps: 2,
            protected_apps: 2,
        })));

        let log = std::fs::read_to_string(log_path(h.dir.path(), 99)).unwrap();
        assert!(log.contains("REMOVED app=10 package=1"));
        assert!(log.contains("SKIPPED app=11 package=1"));
        assert!(!log.contains("app=12"));
    }

    #[tokio::test]
    async fn test_declined_confirmation_touches_nothing() {
        let h = harness(paid_and_free_catalog(), "no");

        let outcome = h.engine.run(&paid_and_free_snapshot()).await.unwrap();

        assert_eq!(outcome, PipelineOutcome::Cancelled);
        assert!(h.account.revoked().is_empty());
        assert!(!log_path(h.dir.path(), 99).exists());
        assert_eq!(h.sink.count(|k| *k == EventKind::Cancelled), 1);
    }

    #[tokio::test]
    async fn test_no_complimentary_licenses() {
        let h = harness(paid_and_free_catalog(), "yes");
        let snapshot = LicenseSnapshot::from_licenses([license(2, PaymentMethod::CreditCard)]);

        let outcome = h.engine.run(&snapshot).await.unwrap();

        assert_eq!(outcome, PipelineOutcome::NothingToRemove);
        assert_eq!(h.gate.prompts(), 0);
        assert!(h.account.revoked().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_error_aborts_before_prompt() {
        let h = harness(paid_and_free_catalog().fail_on_call(0), "yes");

        let err = h.engine.run(&paid_and_free_snapshot()).await.unwrap_err();

        assert!(matches!(err, EngineError::Fetch { chunk: 0, .. }));
        assert_eq!(h.gate.prompts(), 0);
        assert!(h.account.revoked().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_record_aborts() {
        let catalog = paid_and_free_catalog().with_raw(RawPackageRecord {
            packageid: 2,
            keyvalues: serde_json::json!({"appids": [11]}),
        });
        let h = harness(catalog, "yes");

        let err = h.engine.run(&paid_and_free_snapshot()).await.unwrap_err();

        assert!(matches!(err, EngineError::MalformedRecord { package_id: 2, .. }));
        assert!(h.account.revoked().is_empty());
    }

    #[tokio::test]
    async fn test_skipped_package_neither_protects_nor_removes() {
        let catalog = FakeCatalog::default()
            .with_package(1, &[10], AVAILABLE, SINGLE_PURCHASE, FREE_ON_DEMAND)
            .with_package(3, &[10, 30], AVAILABLE, 6, FREE_ON_DEMAND);
        let h = harness(catalog, "yes");
        let snapshot = LicenseSnapshot::from_licenses([
            license(1, PaymentMethod::Complimentary),
            license(3, PaymentMethod::Complimentary),
        ]);

        let outcome = h.engine.run(&snapshot).await.unwrap();

        assert_eq!(
            outcome,
            PipelineOutcome::Completed(RemovalSummary {
                removed: 1,
                skipped: 0,
                failed: 0
            })
        );
        assert_eq!(h.account.revoked(), vec![10]);
        assert_eq!(h.sink.count(|k| *k == EventKind::PackageSkipped), 1);
    }

    #[tokio::test]
    async fn test_empty_chunk_contributes_nothing() {
        let mut h = harness(paid_and_free_catalog().empty_on_call(0), "yes");
        h.engine.settings.chunk_size = 1;

        let outcome = h.engine.run(&paid_and_free_snapshot()).await.unwrap();

        // Package 1's chunk came back empty, so there is nothing to remove.
        assert_eq!(outcome, PipelineOutcome::Completed(RemovalSummary::default()));
        assert!(h.account.revoked().is_empty());
    }
}
