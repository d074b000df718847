//! Ads insights client seam. The core only sees rows; how they are fetched
//! is up to the implementation behind [`InsightsClient`].

use adfunnel_core::{FunnelResult, RowTable};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Breakdown that slices insights into advertiser-time-zone hours.
pub const HOURLY_BREAKDOWN: &str = "hourly_stats_aggregated_by_advertiser_time_zone";

pub const ACCESS_TOKEN_PARAM: &str = "access_token";

/// One insights query against an ad account.
#[derive(Clone, Serialize)]
pub struct InsightsRequest {
    pub account_id: String,
    #[serde(skip)]
    pub access_token: String,
    pub level: String,
    pub fields: Vec<String>,
    pub since: NaiveDate,
    pub until: NaiveDate,
    pub breakdowns: Vec<String>,
}

impl std::fmt::Debug for InsightsRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InsightsRequest")
            .field("account_id", &self.account_id)
            .field("access_token", &"***")
            .field("level", &self.level)
            .field("fields", &self.fields)
            .field("since", &self.since)
            .field("until", &self.until)
            .field("breakdowns", &self.breakdowns)
            .finish()
    }
}

impl InsightsRequest {
    pub fn new(account_id: impl Into<String>, access_token: impl Into<String>, since: NaiveDate, until: NaiveDate) -> Self {
        Self {
            account_id: account_id.into(),
            access_token: access_token.into(),
            level: "account".to_string(),
            fields: default_fields(),
            since,
            until,
            breakdowns: Vec::new(),
        }
    }

    pub fn with_breakdown(mut self, breakdown: impl Into<String>) -> Self {
        self.breakdowns.push(breakdown.into());
        self
    }

    pub fn with_hourly_breakdown(self) -> Self {
        self.with_breakdown(HOURLY_BREAKDOWN)
    }

    pub fn is_hourly(&self) -> bool {
        self.breakdowns.iter().any(|b| b == HOURLY_BREAKDOWN)
    }

    /// Same request with the hourly dimension removed; other breakdowns
    /// are kept.
    pub fn without_hourly_breakdown(&self) -> Self {
        let mut request = self.clone();
        request.breakdowns.retain(|b| b != HOURLY_BREAKDOWN);
        request
    }

    /// Wire parameters, token included. Only the HTTP adapter should need
    /// this; diagnostics go through `debug::sanitized_params`.
    pub fn params(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        params.insert(ACCESS_TOKEN_PARAM.to_string(), self.access_token.clone());
        params.insert("level".to_string(), self.level.clone());
        params.insert("fields".to_string(), self.fields.join(","));
        params.insert(
            "time_range".to_string(),
            serde_json::json!({
                "since": self.since.format("%Y-%m-%d").to_string(),
                "until": self.until.format("%Y-%m-%d").to_string(),
            })
            .to_string(),
        );
        if !self.breakdowns.is_empty() {
            params.insert("breakdowns".to_string(), self.breakdowns.join(","));
        }
        params
    }
}

fn default_fields() -> Vec<String> {
    [
        "impressions",
        "reach",
        "frequency",
        "spend",
        "clicks",
        "inline_link_clicks",
        "actions",
    ]
    .iter()
    .map(|f| f.to_string())
    .collect()
}

/// Rows returned for one request.
#[derive(Debug, Clone, Default)]
pub struct InsightsResponse {
    pub rows: RowTable,
}

/// Trait for ads insights sources.
pub trait InsightsClient: Send + Sync {
    fn fetch(&self, request: &InsightsRequest) -> FunnelResult<InsightsResponse>;
}
