// HTTP client for the rollcall check-in endpoint
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::RollcallConfig;
use crate::error::RollcallError;

pub const MSG_SUCCESS: &str = "點名成功";
pub const MSG_FAILURE: &str = "點名失敗";
pub const MSG_UNREACHABLE: &str = "無法連接伺服器";

/// Body of `POST /rollcall/`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckInRequest {
    pub username: String,
    pub password: String,
    pub rollcall_goto: String,
}

/// What one check-in call came back with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckInOutcome {
    pub success: bool,
    pub message: String,
}

impl CheckInOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Anything that can perform a single check-in. Never errors: every problem
/// is folded into a failed outcome.
#[async_trait]
pub trait CheckInEndpoint: Send + Sync {
    async fn check_in(&self, request: &CheckInRequest) -> CheckInOutcome;
}

pub struct RollcallClient {
    url: String,
    client: Client,
}

impl RollcallClient {
    pub fn new(url: String, timeout: Duration) -> Result<Self, RollcallError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RollcallError::Http(e.to_string()))?;
        Ok(Self { url, client })
    }

    pub fn from_config(config: &RollcallConfig) -> Result<Self, RollcallError> {
        Self::new(
            config.rollcall_endpoint(),
            Duration::from_secs(config.client.timeout_secs),
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CheckInEndpoint for RollcallClient {
    async fn check_in(&self, request: &CheckInRequest) -> CheckInOutcome {
        debug!("POST {} for {}", self.url, request.username);

        let response = match self.client.post(&self.url).json(request).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("Check-in request for {} failed: {}", request.username, e);
                return CheckInOutcome::failure(MSG_UNREACHABLE);
            }
        };

        let status = response.status();
        let body = match response.bytes().await {
            Ok(b) => b,
            Err(e) => {
                warn!("Reading check-in response for {} failed: {}", request.username, e);
                return CheckInOutcome::failure(MSG_UNREACHABLE);
            }
        };
        let json: Option<serde_json::Value> = serde_json::from_slice(&body).ok();

        if status.is_success() {
            CheckInOutcome::success(string_field(&json, "message").unwrap_or(MSG_SUCCESS))
        } else {
            debug!("Check-in for {} rejected with {}", request.username, status);
            CheckInOutcome::failure(string_field(&json, "detail").unwrap_or(MSG_FAILURE))
        }
    }
}

fn string_field<'a>(json: &'a Option<serde_json::Value>, key: &str) -> Option<&'a str> {
    json.as_ref()?
        .get(key)?
        .as_str()
        .filter(|s| !s.is_empty())
}
