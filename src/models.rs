use serde::{Deserialize, Serialize};

/// A grant linking the account to one catalog package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct License {
    pub package_id: u32,
    #[serde(rename = "payment_method")]
    pub acquisition_method: PaymentMethod,
    #[serde(rename = "license_type")]
    pub grant_type: LicenseType,
    pub access_token: AccessToken,
}

impl License {
    /// Zero-cost acquisition under a single-purchase grant: the only shape that may be removed.
    pub fn is_complimentary_candidate(&self) -> bool {
        self.acquisition_method == PaymentMethod::Complimentary
            && self.grant_type == LicenseType::SinglePurchase
    }
}

/// Opaque token the catalog needs to disclose a package's metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(pub u64);

/// One entry of a catalog request chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRequest {
    pub package_id: u32,
    pub access_token: AccessToken,
}

impl From<&License> for PackageRequest {
    fn from(license: &License) -> Self {
        PackageRequest {
            package_id: license.package_id,
            access_token: license.access_token,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum PaymentMethod {
    None,
    ActivationCode,
    CreditCard,
    PayPal,
    GuestPass,
    HardwarePromo,
    AutoGrant,
    Wallet,
    Promotional,
    OemTicket,
    Split,
    Complimentary,
    Other(u32),
}

impl From<u32> for PaymentMethod {
    fn from(raw: u32) -> Self {
        match raw {
            0 => PaymentMethod::None,
            1 => PaymentMethod::ActivationCode,
            2 => PaymentMethod::CreditCard,
            4 => PaymentMethod::PayPal,
            8 => PaymentMethod::GuestPass,
            16 => PaymentMethod::HardwarePromo,
            64 => PaymentMethod::AutoGrant,
            128 => PaymentMethod::Wallet,
            131 => PaymentMethod::Promotional,
            256 => PaymentMethod::OemTicket,
            512 => PaymentMethod::Split,
            1024 => PaymentMethod::Complimentary,
            other => PaymentMethod::Other(other),
        }
    }
}

impl From<PaymentMethod> for u32 {
    fn from(method: PaymentMethod) -> Self {
        match method {
            PaymentMethod::None => 0,
            PaymentMethod::ActivationCode => 1,
            PaymentMethod::CreditCard => 2,
            PaymentMethod::PayPal => 4,
            PaymentMethod::GuestPass => 8,
            PaymentMethod::HardwarePromo => 16,
            PaymentMethod::AutoGrant => 64,
            PaymentMethod::Wallet => 128,
            PaymentMethod::Promotional => 131,
            PaymentMethod::OemTicket => 256,
            PaymentMethod::Split => 512,
            PaymentMethod::Complimentary => 1024,
            PaymentMethod::Other(raw) => raw,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::None => write!(f, "None"),
            PaymentMethod::ActivationCode => write!(f, "ActivationCode"),
            PaymentMethod::CreditCard => write!(f, "CreditCard"),
            PaymentMethod::PayPal => write!(f, "PayPal"),
            PaymentMethod::GuestPass => write!(f, "GuestPass"),
            PaymentMethod::HardwarePromo => write!(f, "HardwarePromo"),
            PaymentMethod::AutoGrant => write!(f, "AutoGrant"),
            PaymentMethod::Wallet => write!(f, "Wallet"),
            PaymentMethod::Promotional => write!(f, "Promotional"),
            PaymentMethod::OemTicket => write!(f, "OEMTicket"),
            PaymentMethod::Split => write!(f, "Split"),
            PaymentMethod::Complimentary => write!(f, "Complimentary"),
            PaymentMethod::Other(raw) => write!(f, "{}", raw),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum LicenseType {
    NoLicense,
    SinglePurchase,
    SinglePurchaseLimitedUse,
    RecurringCharge,
    RecurringChargeLimitedUse,
    RecurringChargeLimitedUseWithOverages,
    RecurringOption,
    LimitedUseDelayedActivation,
    Other(u32),
}

impl From<u32> for LicenseType {
    fn from(raw: u32) -> Self {
        match raw {
            0 => LicenseType::NoLicense,
            1 => LicenseType::SinglePurchase,
            2 => LicenseType::SinglePurchaseLimitedUse,
            3 => LicenseType::RecurringCharge,
            4 => LicenseType::RecurringChargeLimitedUse,
            5 => LicenseType::RecurringChargeLimitedUseWithOverages,
            6 => LicenseType::RecurringOption,
            7 => LicenseType::LimitedUseDelayedActivation,
            other => LicenseType::Other(other),
        }
    }
}

impl From<LicenseType> for u32 {
    fn from(kind: LicenseType) -> Self {
        match kind {
            LicenseType::NoLicense => 0,
            LicenseType::SinglePurchase => 1,
            LicenseType::SinglePurchaseLimitedUse => 2,
            LicenseType::RecurringCharge => 3,
            LicenseType::RecurringChargeLimitedUse => 4,
            LicenseType::RecurringChargeLimitedUseWithOverages => 5,
            LicenseType::RecurringOption => 6,
            LicenseType::LimitedUseDelayedActivation => 7,
            LicenseType::Other(raw) => raw,
        }
    }
}

impl std::fmt::Display for LicenseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LicenseType::NoLicense => write!(f, "NoLicense"),
            LicenseType::SinglePurchase => write!(f, "SinglePurchase"),
            LicenseType::SinglePurchaseLimitedUse => write!(f, "SinglePurchaseLimitedUse"),
            LicenseType::RecurringCharge => write!(f, "RecurringCharge"),
            LicenseType::RecurringChargeLimitedUse => write!(f, "RecurringChargeLimitedUse"),
            LicenseType::RecurringChargeLimitedUseWithOverages => {
                write!(f, "RecurringChargeLimitedUseWithOverages")
            }
            LicenseType::RecurringOption => write!(f, "RecurringOption"),
            LicenseType::LimitedUseDelayedActivation => write!(f, "LimitedUseDelayedActivation"),
            LicenseType::Other(raw) => write!(f, "{}", raw),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum PackageStatus {
    Available,
    Preorder,
    Unavailable,
    Invalid,
    Other(u32),
}

impl From<u32> for PackageStatus {
    fn from(raw: u32) -> Self {
        match raw {
            0 => PackageStatus::Available,
            1 => PackageStatus::Preorder,
            2 => PackageStatus::Unavailable,
            3 => PackageStatus::Invalid,
            other => PackageStatus::Other(other),
        }
    }
}

impl From<PackageStatus> for u32 {
    fn from(status: PackageStatus) -> Self {
        match status {
            PackageStatus::Available => 0,
            PackageStatus::Preorder => 1,
            PackageStatus::Unavailable => 2,
            PackageStatus::Invalid => 3,
            PackageStatus::Other(raw) => raw,
        }
    }
}

impl std::fmt::Display for PackageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PackageStatus::Available => write!(f, "Available"),
            PackageStatus::Preorder => write!(f, "Preorder"),
            PackageStatus::Unavailable => write!(f, "Unavailable"),
            PackageStatus::Invalid => write!(f, "Invalid"),
            PackageStatus::Other(raw) => write!(f, "{}", raw),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum BillingType {
    NoCost,
    BillOnceOnly,
    BillMonthly,
    ProofOfPrepurchaseOnly,
    GuestPass,
    HardwarePromo,
    Gift,
    AutoGrant,
    OemTicket,
    RecurringOption,
    BillOnceOrCdKey,
    Repurchaseable,
    FreeOnDemand,
    Rental,
    CommercialLicense,
    FreeCommercialLicense,
    Other(u32),
}

impl From<u32> for BillingType {
    fn from(raw: u32) -> Self {
        match raw {
            0 => BillingType::NoCost,
            1 => BillingType::BillOnceOnly,
            2 => BillingType::BillMonthly,
            3 => BillingType::ProofOfPrepurchaseOnly,
            4 => BillingType::GuestPass,
            5 => BillingType::HardwarePromo,
            6 => BillingType::Gift,
            7 => BillingType::AutoGrant,
            8 => BillingType::OemTicket,
            9 => BillingType::RecurringOption,
            10 => BillingType::BillOnceOrCdKey,
            11 => BillingType::Repurchaseable,
            12 => BillingType::FreeOnDemand,
            13 => BillingType::Rental,
            14 => BillingType::CommercialLicense,
            15 => BillingType::FreeCommercialLicense,
            other => BillingType::Other(other),
        }
    }
}

impl From<BillingType> for u32 {
    fn from(billing: BillingType) -> Self {
        match billing {
            BillingType::NoCost => 0,
            BillingType::BillOnceOnly => 1,
            BillingType::BillMonthly => 2,
            BillingType::ProofOfPrepurchaseOnly => 3,
            BillingType::GuestPass => 4,
            BillingType::HardwarePromo => 5,
            BillingType::Gift => 6,
            BillingType::AutoGrant => 7,
            BillingType::OemTicket => 8,
            BillingType::RecurringOption => 9,
            BillingType::BillOnceOrCdKey => 10,
            BillingType::Repurchaseable => 11,
            BillingType::FreeOnDemand => 12,
            BillingType::Rental => 13,
            BillingType::CommercialLicense => 14,
            BillingType::FreeCommercialLicense => 15,
            BillingType::Other(raw) => raw,
        }
    }
}

impl std::fmt::Display for BillingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BillingType::NoCost => write!(f, "NoCost"),
            BillingType::BillOnceOnly => write!(f, "BillOnceOnly"),
            BillingType::BillMonthly => write!(f, "BillMonthly"),
            BillingType::ProofOfPrepurchaseOnly => write!(f, "ProofOfPrepurchaseOnly"),
            BillingType::GuestPass => write!(f, "GuestPass"),
            BillingType::HardwarePromo => write!(f, "HardwarePromo"),
            BillingType::Gift => write!(f, "Gift"),
            BillingType::AutoGrant => write!(f, "AutoGrant"),
            BillingType::OemTicket => write!(f, "OEMTicket"),
            BillingType::RecurringOption => write!(f, "RecurringOption"),
            BillingType::BillOnceOrCdKey => write!(f, "BillOnceOrCDKey"),
            BillingType::Repurchaseable => write!(f, "Repurchaseable"),
            BillingType::FreeOnDemand => write!(f, "FreeOnDemand"),
            BillingType::Rental => write!(f, "Rental"),
            BillingType::CommercialLicense => write!(f, "CommercialLicense"),
            BillingType::FreeCommercialLicense => write!(f, "FreeCommercialLicense"),
            BillingType::Other(raw) => write!(f, "{}", raw),
        }
    }
}

/// Catalog view of one package, mapped from a raw record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageMetadata {
    pub package_id: u32,
    pub app_ids: std::collections::BTreeSet<u32>,
    pub status: PackageStatus,
    pub license_type: LicenseType,
    pub billing_type: BillingType,
}

/// Numeric result reported by the remote for a revoke call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultCode(pub u32);

impl ResultCode {
    pub const OK: ResultCode = ResultCode(1);

    pub fn is_ok(self) -> bool {
        self == Self::OK
    }
}

impl std::fmt::Display for ResultCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self.0 {
            1 => "OK",
            2 => "Fail",
            3 => "NoConnection",
            8 => "InvalidParam",
            9 => "FileNotFound",
            10 => "Busy",
            11 => "InvalidState",
            15 => "AccessDenied",
            16 => "Timeout",
            20 => "ServiceUnavailable",
            21 => "NotLoggedOn",
            25 => "LimitExceeded",
            26 => "Revoked",
            27 => "Expired",
            84 => "RateLimitExceeded",
            other => return write!(f, "{}", other),
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemovalOutcome {
    Removed,
    Skipped,
    Failed,
}

impl std::fmt::Display for RemovalOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemovalOutcome::Removed => write!(f, "REMOVED"),
            RemovalOutcome::Skipped => write!(f, "SKIPPED"),
            RemovalOutcome::Failed => write!(f, "FAILED"),
        }
    }
}

/// One audit line. Written once, never rewritten.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemovalRecord {
    pub app_id: u32,
    pub package_id: u32,
    pub outcome: RemovalOutcome,
    pub detail: Option<String>,
}

impl std::fmt::Display for RemovalRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} app={} package={}", self.outcome, self.app_id, self.package_id)?;
        match (&self.outcome, &self.detail) {
            (RemovalOutcome::Skipped, Some(reason)) => write!(f, " reason=\"{}\"", reason),
            (RemovalOutcome::Failed, Some(result)) => write!(f, " result={}", result),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RemovalSummary {
    pub removed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RemovalSummary {
    pub fn tally(&mut self, outcome: RemovalOutcome) {
        match outcome {
            RemovalOutcome::Removed => self.removed += 1,
            RemovalOutcome::Skipped => self.skipped += 1,
            RemovalOutcome::Failed => self.failed += 1,
        }
    }
}

impl std::fmt::Display for RemovalSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Removed {}, Skipped {}, Failed {}",
            self.removed, self.skipped, self.failed
        )
    }
}
