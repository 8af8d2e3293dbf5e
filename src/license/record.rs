use std::collections::BTreeSet;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{EngineError, Result};
use crate::models::PackageMetadata;

/// A package record as the catalog returns it: an id plus a nested key/value tree.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPackageRecord {
    pub packageid: u32,
    #[serde(default)]
    pub keyvalues: Value,
}

/// Map a raw record to [`PackageMetadata`].
///
/// Every field the classifier reads must be present and numeric. Defaulting a
/// missing field could turn a protected package into a removable one.
pub fn parse_metadata(record: &RawPackageRecord) -> Result<PackageMetadata> {
    let kv = &record.keyvalues;

    Ok(PackageMetadata {
        package_id: record.packageid,
        app_ids: app_ids(record.packageid, kv)?,
        status: number(record.packageid, kv, "status")?.into(),
        license_type: number(record.packageid, kv, "licensetype")?.into(),
        billing_type: number(record.packageid, kv, "billingtype")?.into(),
    })
}

fn malformed(package_id: u32, reason: impl Into<String>) -> EngineError {
    EngineError::MalformedRecord {
        package_id,
        reason: reason.into(),
    }
}

/// Key/value leaves arrive either as JSON numbers or as decimal strings.
fn as_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn number(package_id: u32, kv: &Value, key: &str) -> Result<u32> {
    let value = kv
        .get(key)
        .ok_or_else(|| malformed(package_id, format!("missing `{}`", key)))?;
    as_u32(value).ok_or_else(|| malformed(package_id, format!("`{}` is not a number: {}", key, value)))
}

/// `appids` is a list of children, keyed by index (`{"0": "10"}`) or as a plain array.
fn app_ids(package_id: u32, kv: &Value) -> Result<BTreeSet<u32>> {
    let children: Vec<&Value> = match kv.get("appids") {
        Some(Value::Object(map)) => map.values().collect(),
        Some(Value::Array(items)) => items.iter().collect(),
        Some(other) => {
            return Err(malformed(
                package_id,
                format!("`appids` is not a list: {}", other),
            ))
        }
        None => return Err(malformed(package_id, "missing `appids`")),
    };

    children
        .into_iter()
        .map(|child| {
            as_u32(child)
                .ok_or_else(|| malformed(package_id, format!("app id is not a number: {}", child)))
        })
        .collect()
}
