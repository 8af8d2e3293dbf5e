//! In-memory stand-ins for the remote services.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::json;

use crate::account::{AccountService, ConfirmationGate};
use crate::catalog::CatalogService;
use crate::license::record::RawPackageRecord;
use crate::models::{PackageRequest, ResultCode};

/// Catalog that answers from a fixed record table and remembers each call's size.
#[derive(Default)]
pub struct FakeCatalog {
    records: HashMap<u32, RawPackageRecord>,
    empty_calls: HashSet<usize>,
    failing_calls: HashSet<usize>,
    calls: Mutex<Vec<usize>>,
}

impl FakeCatalog {
    pub fn with_package(
        mut self,
        package_id: u32,
        app_ids: &[u32],
        status: u32,
        license_type: u32,
        billing_type: u32,
    ) -> Self {
        let appids: serde_json::Map<String, serde_json::Value> = app_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (i.to_string(), json!(id.to_string())))
            .collect();
        self.records.insert(
            package_id,
            RawPackageRecord {
                packageid: package_id,
                keyvalues: json!({
                    "appids": appids,
                    "status": status.to_string(),
                    "licensetype": license_type.to_string(),
                    "billingtype": billing_type.to_string(),
                }),
            },
        );
        self
    }

    pub fn with_raw(mut self, record: RawPackageRecord) -> Self {
        self.records.insert(record.packageid, record);
        self
    }

    /// The `n`th call (zero-based) returns no results.
    pub fn empty_on_call(mut self, n: usize) -> Self {
        self.empty_calls.insert(n);
        self
    }

    pub fn fail_on_call(mut self, n: usize) -> Self {
        self.failing_calls.insert(n);
        self
    }

    pub fn call_sizes(&self) -> Vec<usize> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogService for FakeCatalog {
    async fn fetch(&self, chunk: &[PackageRequest]) -> Result<Option<Vec<RawPackageRecord>>> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(chunk.len());
            calls.len() - 1
        };

        if self.failing_calls.contains(&call) {
            return Err(anyhow!("connection reset"));
        }
        if self.empty_calls.contains(&call) {
            return Ok(None);
        }

        Ok(Some(
            chunk
                .iter()
                .filter_map(|req| self.records.get(&req.package_id).cloned())
                .collect(),
        ))
    }
}

/// Account that answers `OK` unless told otherwise and remembers every revoke.
pub struct FakeAccount {
    account_id: u32,
    responses: HashMap<u32, ResultCode>,
    transport_errors: HashSet<u32>,
    revoked: Mutex<Vec<u32>>,
}

impl FakeAccount {
    pub fn new(account_id: u32) -> Self {
        FakeAccount {
            account_id,
            responses: HashMap::new(),
            transport_errors: HashSet::new(),
            revoked: Mutex::new(Vec::new()),
        }
    }

    pub fn respond(mut self, app_id: u32, code: ResultCode) -> Self {
        self.responses.insert(app_id, code);
        self
    }

    pub fn transport_error(mut self, app_id: u32) -> Self {
        self.transport_errors.insert(app_id);
        self
    }

    pub fn revoked(&self) -> Vec<u32> {
        self.revoked.lock().unwrap().clone()
    }
}

#[async_trait]
impl AccountService for FakeAccount {
    fn account_id(&self) -> u32 {
        self.account_id
    }

    async fn revoke(&self, app_id: u32) -> Result<ResultCode> {
        self.revoked.lock().unwrap().push(app_id);
        if self.transport_errors.contains(&app_id) {
            return Err(anyhow!("request timed out"));
        }
        Ok(self.responses.get(&app_id).copied().unwrap_or(ResultCode::OK))
    }
}

/// Gate with a scripted answer.
pub struct FixedAnswer {
    answer: &'static str,
    prompts: Mutex<Vec<String>>,
}

impl FixedAnswer {
    pub fn new(answer: &'static str) -> Self {
        FixedAnswer {
            answer,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl ConfirmationGate for FixedAnswer {
    async fn confirm(&self, prompt: &str) -> std::io::Result<bool> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(crate::account::is_affirmative(self.answer))
    }
}
