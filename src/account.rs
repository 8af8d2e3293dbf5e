use anyhow::Result;
use async_trait::async_trait;

use crate::models::ResultCode;

/// The logged-on account, as seen by the removal step.
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Identifier used to name the audit log.
    fn account_id(&self) -> u32;

    /// Cancel the account's license for one app. `Err` means the call itself failed.
    async fn revoke(&self, app_id: u32) -> Result<ResultCode>;
}

/// Asks the user to approve the removal. Only an explicit "yes" counts.
#[async_trait]
pub trait ConfirmationGate: Send + Sync {
    async fn confirm(&self, prompt: &str) -> std::io::Result<bool>;
}

/// Case-insensitive "yes", surrounding whitespace ignored.
pub fn is_affirmative(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("yes")
}
