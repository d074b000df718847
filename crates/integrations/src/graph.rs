//! Marketing Graph API adapter for [`InsightsClient`].

use crate::client::{InsightsClient, InsightsRequest, InsightsResponse};
use adfunnel_core::config::AdsApiConfig;
use adfunnel_core::{FunnelError, FunnelResult, RowTable};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub struct GraphApiClient {
    http: reqwest::blocking::Client,
    base_url: String,
    api_version: String,
    timeout_ms: u64,
}

impl GraphApiClient {
    pub fn new(config: &AdsApiConfig) -> FunnelResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| FunnelError::Connection(e.without_url().to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            timeout_ms: config.timeout_ms,
        })
    }

    fn endpoint(&self, account_id: &str) -> String {
        format!(
            "{}/{}/act_{}/insights",
            self.base_url,
            self.api_version,
            account_id.trim_start_matches("act_")
        )
    }

    // The URL carries the token in its query string, so it is dropped from
    // every transport error before the message is kept.
    fn transport_error(&self, err: reqwest::Error) -> FunnelError {
        if err.is_timeout() {
            FunnelError::Timeout {
                timeout_ms: self.timeout_ms,
            }
        } else if err.is_connect() || err.is_request() {
            FunnelError::Connection(err.without_url().to_string())
        } else {
            FunnelError::Decode(err.without_url().to_string())
        }
    }
}

impl InsightsClient for GraphApiClient {
    fn fetch(&self, request: &InsightsRequest) -> FunnelResult<InsightsResponse> {
        let url = self.endpoint(&request.account_id);
        debug!(
            account_id = %request.account_id,
            breakdowns = ?request.breakdowns,
            "Fetching ads insights"
        );

        let resp = self
            .http
            .get(&url)
            .query(&request.params())
            .send()
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status().as_u16();
        let body = resp.text().map_err(|e| self.transport_error(e))?;
        decode_insights_body(status, &body)
    }
}

/// Turn an insights response body into rows, or into the API's own error.
pub fn decode_insights_body(status: u16, body: &str) -> FunnelResult<InsightsResponse> {
    let parsed: Option<Value> = serde_json::from_str(body).ok();

    if let Some(error) = parsed.as_ref().and_then(|v| v.get("error")) {
        return Err(FunnelError::Api {
            code: error
                .get("code")
                .and_then(Value::as_i64)
                .unwrap_or(i64::from(status)),
            message: error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
        });
    }

    if !(200..300).contains(&status) {
        return Err(FunnelError::Api {
            code: i64::from(status),
            message: body.chars().take(200).collect(),
        });
    }

    match parsed.as_ref().and_then(|v| v.get("data")) {
        Some(data @ Value::Array(_)) => Ok(InsightsResponse {
            rows: RowTable::from_json(data),
        }),
        _ => Err(FunnelError::Decode(
            "response has no 'data' array".to_string(),
        )),
    }
}
