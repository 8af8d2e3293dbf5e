//! HTTP adapter for the account and catalog services.
//!
//! Talks JSON to a gateway that fronts the remote platform:
//!
//! | Call                          | Response                                   |
//! |-------------------------------|--------------------------------------------|
//! | `GET  /v1/account`            | `{"account_id": u32}`                      |
//! | `GET  /v1/licenses`           | `{"licenses": [License]}`                  |
//! | `POST /v1/catalog/packages`   | `{"results": [RawPackageRecord] \| null}`  |
//! | `POST /v1/licenses/revoke`    | `{"result": u32}`                          |

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::account::AccountService;
use crate::catalog::CatalogService;
use crate::config::GatewayConfig;
use crate::license::record::RawPackageRecord;
use crate::models::{License, PackageRequest, ResultCode};

const USER_AGENT: &str = concat!("license-sweeper/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct AccountResponse {
    account_id: u32,
}

#[derive(Debug, Deserialize)]
struct LicensesResponse {
    licenses: Vec<License>,
}

#[derive(Debug, Serialize)]
struct PackagesRequest<'a> {
    packages: &'a [PackageRequest],
}

#[derive(Debug, Deserialize)]
struct PackagesResponse {
    #[serde(default)]
    results: Option<Vec<RawPackageRecord>>,
}

#[derive(Debug, Serialize)]
struct RevokeRequest {
    appid: u32,
}

#[derive(Debug, Deserialize)]
struct RevokeResponse {
    result: ResultCode,
}

#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    token: Option<String>,
    account_id: u32,
}

impl HttpGateway {
    /// Build the client and resolve the logged-on account.
    pub async fn connect(config: &GatewayConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        let token = std::env::var(&config.token_env).ok().filter(|t| !t.is_empty());
        if token.is_none() {
            tracing::warn!(var = %config.token_env, "no gateway token set, sending unauthenticated requests");
        }

        let mut gateway = HttpGateway {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token,
            account_id: 0,
        };

        let account: AccountResponse = gateway
            .send(gateway.get("/v1/account"))
            .await
            .context("resolving account")?;
        gateway.account_id = account.account_id;

        Ok(gateway)
    }

    pub async fn licenses(&self) -> Result<Vec<License>> {
        let response: LicensesResponse = self.send(self.get("/v1/licenses")).await?;
        Ok(response.licenses)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.get(format!("{}{}", self.base_url, path)))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.post(format!("{}{}", self.base_url, path)))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request
            .header("Accept", "application/json")
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl CatalogService for HttpGateway {
    async fn fetch(&self, chunk: &[PackageRequest]) -> Result<Option<Vec<RawPackageRecord>>> {
        let response: PackagesResponse = self
            .send(self.post("/v1/catalog/packages").json(&PackagesRequest { packages: chunk }))
            .await
            .with_context(|| format!("fetching info for {} packages", chunk.len()))?;

        Ok(response.results.filter(|r| !r.is_empty()))
    }
}

#[async_trait]
impl AccountService for HttpGateway {
    fn account_id(&self) -> u32 {
        self.account_id
    }

    async fn revoke(&self, app_id: u32) -> Result<ResultCode> {
        let response: RevokeResponse = self
            .send(self.post("/v1/licenses/revoke").json(&RevokeRequest { appid: app_id }))
            .await?;
        Ok(response.result)
    }
}

/// Poll the license list every `interval` and forward each list to the session.
///
/// A failed poll is logged and retried on the next tick. Returns when the
/// receiving side has gone away.
pub async fn poll_licenses(gateway: HttpGateway, interval: Duration, tx: mpsc::Sender<Vec<License>>) {
    let mut ticker = tokio::time::interval(interval);

    loop {
        ticker.tick().await;

        match gateway.licenses().await {
            Ok(licenses) => {
                tracing::debug!(count = licenses.len(), "license list polled");
                if tx.send(licenses).await.is_err() {
                    return;
                }
            }
            Err(e) => {
                let message = format!("{:#}", e);
                tracing::warn!(error = %message, "license poll failed");
            }
        }
    }
}
