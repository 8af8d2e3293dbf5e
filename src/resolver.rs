use std::collections::{BTreeMap, BTreeSet};

use crate::license::classifier::Classification;

/// Candidate packages and their apps. Entries stay even when an app is protected elsewhere.
pub type RemovableMap = BTreeMap<u32, BTreeSet<u32>>;

/// Apps that at least one package protects. Only ever grows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtectionSet(BTreeSet<u32>);

impl ProtectionSet {
    /// Returns `true` the first time `app_id` becomes protected.
    pub fn insert(&mut self, app_id: u32) -> bool {
        self.0.insert(app_id)
    }

    pub fn contains(&self, app_id: u32) -> bool {
        self.0.contains(&app_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<u32> for ProtectionSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        ProtectionSet(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub removable: RemovableMap,
    pub protected: ProtectionSet,
}

impl Resolution {
    /// Distinct app ids across all candidate packages.
    pub fn candidate_apps(&self) -> usize {
        self.removable
            .values()
            .flatten()
            .collect::<BTreeSet<_>>()
            .len()
    }
}

/// Result of feeding one package into the [`Resolver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Absorbed {
    /// Apps that became protected for the first time because of this package.
    Protected(Vec<u32>),
    Candidate,
    Skipped,
}

/// Incremental form of [`resolve`], fed one package at a time as chunks arrive.
#[derive(Debug, Default)]
pub struct Resolver {
    resolution: Resolution,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn absorb(
        &mut self,
        package_id: u32,
        classification: Classification,
        app_ids: &BTreeSet<u32>,
    ) -> Absorbed {
        match classification {
            Classification::ProtectedPaid
            | Classification::ProtectedUnavailable(_)
            | Classification::ProtectedBillingType(_) => {
                let fresh: Vec<u32> = app_ids
                    .iter()
                    .copied()
                    .filter(|app_id| self.resolution.protected.insert(*app_id))
                    .collect();
                tracing::debug!(
                    package_id,
                    newly_protected = fresh.len(),
                    "package protects its apps"
                );
                Absorbed::Protected(fresh)
            }
            Classification::RemovableCandidate => {
                self.resolution
                    .removable
                    .entry(package_id)
                    .or_default()
                    .extend(app_ids.iter().copied());
                Absorbed::Candidate
            }
            Classification::Skip(_) => {
                tracing::debug!(package_id, "skipped: {}", classification.reason(package_id));
                Absorbed::Skipped
            }
        }
    }

    pub fn finish(self) -> Resolution {
        self.resolution
    }
}

/// Aggregate classified packages into the removable map and protection set.
pub fn resolve<'a>(
    classified: impl IntoIterator<Item = (u32, Classification, &'a BTreeSet<u32>)>,
) -> Resolution {
    let mut resolver = Resolver::new();
    for (package_id, classification, app_ids) in classified {
        resolver.absorb(package_id, classification, app_ids);
    }
    resolver.finish()
}
