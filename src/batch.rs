//! Batch check-in
//!
//! One request per selected account, all in flight at once on the current
//! task, joined before anything is reported. A failed account never affects
//! its siblings and nothing is cancelled once started.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::info;

use crate::account::Account;
use crate::client::{CheckInEndpoint, CheckInRequest};
use crate::error::RollcallError;

/// Id reported for the manual single-account path.
pub const MANUAL_ACCOUNT_ID: &str = "manual";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInResult {
    pub account_id: String,
    pub account_label: String,
    pub success: bool,
    pub message: String,
}

/// Results of one submission, in the order the accounts were given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub results: Vec<CheckInResult>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

pub struct Orchestrator {
    endpoint: Arc<dyn CheckInEndpoint>,
}

impl Orchestrator {
    pub fn new(endpoint: Arc<dyn CheckInEndpoint>) -> Self {
        Self { endpoint }
    }

    /// Check in every account in `accounts` with the same goto.
    pub async fn run_batch(
        &self,
        accounts: &[Account],
        goto: &str,
    ) -> Result<BatchReport, RollcallError> {
        if accounts.is_empty() {
            return Err(RollcallError::NoAccountsSelected);
        }
        let goto = require_goto(goto)?;

        info!("Submitting check-in for {} account(s)", accounts.len());

        let pending = accounts.iter().map(|account| {
            self.check_in_one(
                account.id.clone(),
                account.display_label().to_string(),
                CheckInRequest {
                    username: account.username.clone(),
                    password: account.password.clone(),
                    rollcall_goto: goto.to_string(),
                },
            )
        });
        let report = BatchReport {
            results: join_all(pending).await,
        };

        info!(
            "Check-in finished: {} succeeded, {} failed",
            report.succeeded(),
            report.failed()
        );
        Ok(report)
    }

    /// Check in with credentials that are not saved in the store.
    pub async fn run_single(
        &self,
        username: &str,
        password: &str,
        goto: &str,
    ) -> Result<CheckInResult, RollcallError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(RollcallError::MissingCredentials);
        }
        let goto = require_goto(goto)?;

        let result = self
            .check_in_one(
                MANUAL_ACCOUNT_ID.to_string(),
                username.to_string(),
                CheckInRequest {
                    username: username.to_string(),
                    password: password.to_string(),
                    rollcall_goto: goto.to_string(),
                },
            )
            .await;
        info!("Manual check-in for {}: success={}", username, result.success);
        Ok(result)
    }

    async fn check_in_one(
        &self,
        account_id: String,
        account_label: String,
        request: CheckInRequest,
    ) -> CheckInResult {
        let outcome = self.endpoint.check_in(&request).await;
        CheckInResult {
            account_id,
            account_label,
            success: outcome.success,
            message: outcome.message,
        }
    }
}

fn require_goto(goto: &str) -> Result<&str, RollcallError> {
    let goto = goto.trim();
    if goto.is_empty() {
        Err(RollcallError::MissingGoto)
    } else {
        Ok(goto)
    }
}
