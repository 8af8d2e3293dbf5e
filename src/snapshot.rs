use std::collections::{BTreeSet, HashMap};

use crate::events::{EngineEvent, EventKind, EventSink};
use crate::models::License;

/// Point-in-time license set keyed by package id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LicenseSnapshot {
    licenses: HashMap<u32, License>,
}

impl LicenseSnapshot {
    /// Build a snapshot from one license-list event. A repeated package id keeps its first entry.
    pub fn from_licenses(licenses: impl IntoIterator<Item = License>) -> Self {
        let mut map = HashMap::new();
        for license in licenses {
            map.entry(license.package_id).or_insert(license);
        }
        LicenseSnapshot { licenses: map }
    }

    pub fn get(&self, package_id: u32) -> Option<&License> {
        self.licenses.get(&package_id)
    }

    pub fn len(&self) -> usize {
        self.licenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.licenses.is_empty()
    }

    /// Licenses ordered by package id.
    pub fn sorted(&self) -> Vec<&License> {
        let mut licenses: Vec<&License> = self.licenses.values().collect();
        licenses.sort_by_key(|l| l.package_id);
        licenses
    }

    fn keys(&self) -> BTreeSet<u32> {
        self.licenses.keys().copied().collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotDiff {
    pub added: BTreeSet<u32>,
    pub removed: BTreeSet<u32>,
}

impl SnapshotDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Set difference on package ids.
pub fn diff(previous: &LicenseSnapshot, current: &LicenseSnapshot) -> SnapshotDiff {
    let before = previous.keys();
    let after = current.keys();

    SnapshotDiff {
        added: after.difference(&before).copied().collect(),
        removed: before.difference(&after).copied().collect(),
    }
}

/// Emit one notification per changed package id.
///
/// Added ids are annotated from `current`, removed ids from `previous`: each
/// license is described as it was when its snapshot was taken.
pub fn notify(
    changes: &SnapshotDiff,
    previous: &LicenseSnapshot,
    current: &LicenseSnapshot,
    sink: &dyn EventSink,
) {
    for package_id in &changes.added {
        if let Some(license) = current.get(*package_id) {
            tracing::info!(package_id, "license added");
            sink.emit(
                EngineEvent::new(EventKind::LicenseAdded {
                    payment_method: license.acquisition_method,
                    license_type: license.grant_type,
                })
                .package(*package_id),
            );
        }
    }

    for package_id in &changes.removed {
        if let Some(license) = previous.get(*package_id) {
            tracing::info!(package_id, "license removed");
            sink.emit(
                EngineEvent::new(EventKind::LicenseRemoved {
                    payment_method: license.acquisition_method,
                    license_type: license.grant_type,
                })
                .package(*package_id),
            );
        }
    }
}
