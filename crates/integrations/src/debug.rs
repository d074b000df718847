//! Request trail for troubleshooting insights fetches.
//!
//! Secrets are removed while each entry is built: the trail only ever holds
//! sanitized copies, so there is nothing to scrub afterwards.

use crate::client::{InsightsRequest, ACCESS_TOKEN_PARAM};
use adfunnel_core::config::DebugConfig;
use adfunnel_core::Row;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const REDACTED: &str = "***";
const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebugTrail {
    pub requests: Vec<BTreeMap<String, String>>,
    pub fallback_reason: Option<String>,
    pub response_sample: Option<Map<String, Value>>,
}

/// Replace every occurrence of `secret` in `text`.
pub fn redact(text: &str, secret: &str) -> String {
    if secret.is_empty() {
        return text.to_string();
    }
    let mut out = text.replace(secret, REDACTED);
    // Only reachable when the marker itself can rebuild the secret.
    while out.contains(secret) {
        out = out.replace(secret, "");
    }
    out
}

/// Wire parameters with the token field masked and any stray copy of the
/// token removed from the other values.
pub fn sanitized_params(request: &InsightsRequest) -> BTreeMap<String, String> {
    request
        .params()
        .into_iter()
        .map(|(key, value)| {
            let value = if key == ACCESS_TOKEN_PARAM {
                REDACTED.to_string()
            } else {
                redact(&value, &request.access_token)
            };
            (key, value)
        })
        .collect()
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str(ELLIPSIS);
    out
}

fn sanitize_value(value: &Value, secret: &str, max_chars: usize) -> Value {
    match value {
        Value::String(s) => {
            let clipped = truncate(&redact(s, secret), max_chars);
            Value::String(redact(&clipped, secret))
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| sanitize_value(item, secret, max_chars))
                .collect(),
        ),
        Value::Object(map) => Value::Object(sanitize_map(map, secret, max_chars)),
        other => other.clone(),
    }
}

fn sanitize_map(map: &Map<String, Value>, secret: &str, max_chars: usize) -> Map<String, Value> {
    map.iter()
        .map(|(key, value)| (redact(key, secret), sanitize_value(value, secret, max_chars)))
        .collect()
}

/// Builds one [`DebugTrail`] per fetch. The secret to scrub is taken from
/// the first recorded request.
pub struct TrailBuilder {
    secret: String,
    max_requests: usize,
    sample_max_chars: usize,
    trail: DebugTrail,
}

impl TrailBuilder {
    pub fn new(config: &DebugConfig) -> Self {
        Self {
            secret: String::new(),
            max_requests: config.max_requests,
            sample_max_chars: config.sample_max_chars,
            trail: DebugTrail::default(),
        }
    }

    pub fn record_request(&mut self, request: &InsightsRequest) {
        if self.secret.is_empty() {
            self.secret = request.access_token.clone();
        }
        if self.trail.requests.len() < self.max_requests {
            self.trail.requests.push(sanitized_params(request));
        }
    }

    /// Keep the first row seen as the response sample; later calls are
    /// ignored.
    pub fn record_sample(&mut self, row: Option<&Row>) {
        if self.trail.response_sample.is_some() {
            return;
        }
        if let Some(row) = row {
            self.trail.response_sample = Some(sanitize_map(row, &self.secret, self.sample_max_chars));
        }
    }

    pub fn set_fallback_reason(&mut self, reason: &str) {
        self.trail.fallback_reason = Some(reason.to_string());
    }

    pub fn finish(self) -> DebugTrail {
        self.trail
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    const TOKEN: &str = "EAABsbCS1iHgBAKZC9secret";

    fn request() -> InsightsRequest {
        InsightsRequest::new(
            "act_42",
            TOKEN,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )
    }

    #[test]
    fn test_redact() {
        assert_eq!(redact("a=1&access_token=XYZ&b=2", "XYZ"), "a=1&access_token=***&b=2");
        assert_eq!(redact("nothing", ""), "nothing");
        assert!(!redact("***", "*").contains('*'));
        assert!(!redact("aa**", "a*").contains("a*"));
    }

    #[test]
    fn test_sanitized_params_mask_token() {
        let mut req = request();
        req.fields.push(format!("debug_{}", TOKEN));
        let params = sanitized_params(&req);
        assert_eq!(params["access_token"], REDACTED);
        assert!(params.values().all(|v| !v.contains(TOKEN)));
    }

    #[test]
    fn test_truncates_long_strings() {
        let mut builder = TrailBuilder::new(&DebugConfig::default());
        let long = "x".repeat(300);
        let row = json!({"campaign_name": long, "impressions": "10", "nested": {"note": "y".repeat(121)}});
        builder.record_sample(row.as_object());

        let trail = builder.finish();
        let sample = trail.response_sample.unwrap();
        let name = sample["campaign_name"].as_str().unwrap();
        assert_eq!(name.chars().count(), 123);
        assert!(name.ends_with("..."));
        assert_eq!(sample["impressions"], json!("10"));
        assert!(sample["nested"]["note"].as_str().unwrap().ends_with("..."));
    }

    #[test]
    fn test_exactly_at_cap_is_untouched() {
        assert_eq!(truncate(&"é".repeat(120), 120), "é".repeat(120));
    }

    #[test]
    fn test_request_entries_capped() {
        let mut builder = TrailBuilder::new(&DebugConfig::default());
        for _ in 0..5 {
            builder.record_request(&request());
        }
        assert_eq!(builder.finish().requests.len(), 2);
    }

    #[test]
    fn test_sample_scrubs_echoed_token() {
        let mut builder = TrailBuilder::new(&DebugConfig::default());
        builder.record_request(&request());
        let row = json!({
            "paging": format!("https://graph.facebook.com/v19.0/act_42/insights?access_token={}&after=abc", TOKEN),
            TOKEN: 1
        });
        builder.record_sample(row.as_object());
        builder.record_sample(json!({"later": 1}).as_object());

        let trail = builder.finish();
        let serialized = serde_json::to_string(&trail).unwrap();
        assert!(!serialized.contains(TOKEN));
        assert!(trail.response_sample.unwrap().get("later").is_none());
    }
}
