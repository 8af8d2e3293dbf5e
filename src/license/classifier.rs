use serde::Serialize;

use crate::models::{BillingType, LicenseType, PackageMetadata, PackageStatus};

/// What a package means for the apps it bundles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Classification {
    /// Not acquired as a complimentary single purchase.
    ProtectedPaid,
    ProtectedUnavailable(PackageStatus),
    /// Neither protects nor is removed.
    Skip(LicenseType),
    ProtectedBillingType(BillingType),
    RemovableCandidate,
}

impl Classification {
    /// Whether this package's apps must be kept.
    pub fn protects(&self) -> bool {
        matches!(
            self,
            Classification::ProtectedPaid
                | Classification::ProtectedUnavailable(_)
                | Classification::ProtectedBillingType(_)
        )
    }

    /// Human-readable reason, attributed to `package_id`.
    pub fn reason(&self, package_id: u32) -> String {
        match self {
            Classification::ProtectedPaid => format!("paid package {}", package_id),
            Classification::ProtectedUnavailable(status) => {
                format!("package {} status is {}", package_id, status)
            }
            Classification::Skip(license_type) => format!("license type is {}", license_type),
            Classification::ProtectedBillingType(billing) => {
                format!("package {} billing type is {}", package_id, billing)
            }
            Classification::RemovableCandidate => {
                format!("package {} is a free-on-demand grant", package_id)
            }
        }
    }
}

/// Classify one package. First matching rule wins:
///
/// 1. not a complimentary candidate → [`Classification::ProtectedPaid`]
/// 2. status other than `Available` → [`Classification::ProtectedUnavailable`]
/// 3. license type other than `SinglePurchase` → [`Classification::Skip`]
/// 4. billing type other than `FreeOnDemand` → [`Classification::ProtectedBillingType`]
/// 5. otherwise → [`Classification::RemovableCandidate`]
pub fn classify(pkg: &PackageMetadata, is_complimentary_candidate: bool) -> Classification {
    if !is_complimentary_candidate {
        return Classification::ProtectedPaid;
    }

    if pkg.status != PackageStatus::Available {
        return Classification::ProtectedUnavailable(pkg.status);
    }

    if pkg.license_type != LicenseType::SinglePurchase {
        return Classification::Skip(pkg.license_type);
    }

    if pkg.billing_type != BillingType::FreeOnDemand {
        return Classification::ProtectedBillingType(pkg.billing_type);
    }

    Classification::RemovableCandidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn pkg(status: PackageStatus, license_type: LicenseType, billing_type: BillingType) -> PackageMetadata {
        PackageMetadata {
            package_id: 1,
            app_ids: BTreeSet::from([10, 11]),
            status,
            license_type,
            billing_type,
        }
    }

    fn free() -> PackageMetadata {
        pkg(
            PackageStatus::Available,
            LicenseType::SinglePurchase,
            BillingType::FreeOnDemand,
        )
    }

    #[test]
    fn test_removable_candidate() {
        assert_eq!(classify(&free(), true), Classification::RemovableCandidate);
    }

    #[test]
    fn test_paid_wins_over_everything() {
        assert_eq!(classify(&free(), false), Classification::ProtectedPaid);
        let odd = pkg(
            PackageStatus::Invalid,
            LicenseType::RecurringCharge,
            BillingType::Gift,
        );
        assert_eq!(classify(&odd, false), Classification::ProtectedPaid);
    }

    #[test]
    fn test_status_checked_before_license_type() {
        let p = pkg(
            PackageStatus::Unavailable,
            LicenseType::RecurringCharge,
            BillingType::FreeOnDemand,
        );
        assert_eq!(
            classify(&p, true),
            Classification::ProtectedUnavailable(PackageStatus::Unavailable)
        );
    }

    #[test]
    fn test_non_single_purchase_is_skipped() {
        let p = pkg(
            PackageStatus::Available,
            LicenseType::RecurringOption,
            BillingType::BillMonthly,
        );
        let c = classify(&p, true);
        assert_eq!(c, Classification::Skip(LicenseType::RecurringOption));
        assert!(!c.protects());
    }

    #[test]
    fn test_other_billing_type_protects() {
        let p = pkg(
            PackageStatus::Available,
            LicenseType::SinglePurchase,
            BillingType::NoCost,
        );
        let c = classify(&p, true);
        assert_eq!(c, Classification::ProtectedBillingType(BillingType::NoCost));
        assert!(c.protects());
    }

    #[test]
    fn test_classify_is_deterministic() {
        let inputs = [
            (free(), true),
            (free(), false),
            (
                pkg(PackageStatus::Preorder, LicenseType::SinglePurchase, BillingType::FreeOnDemand),
                true,
            ),
            (
                pkg(PackageStatus::Available, LicenseType::Other(40), BillingType::FreeOnDemand),
                true,
            ),
            (
                pkg(PackageStatus::Available, LicenseType::SinglePurchase, BillingType::Other(99)),
                true,
            ),
        ];
        for (p, candidate) in &inputs {
            assert_eq!(classify(p, *candidate), classify(p, *candidate));
        }
    }

    #[test]
    fn test_reason_text() {
        assert_eq!(Classification::ProtectedPaid.reason(12), "paid package 12");
        assert_eq!(
            Classification::ProtectedUnavailable(PackageStatus::Preorder).reason(3),
            "package 3 status is Preorder"
        );
        assert_eq!(
            Classification::Skip(LicenseType::RecurringCharge).reason(3),
            "license type is RecurringCharge"
        );
    }
}
