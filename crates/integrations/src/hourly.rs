//! Insights fetch with the hourly-breakdown fallback.
//!
//! The ads API answers hourly-sliced queries with zero reach and frequency
//! even when the same period without slicing has data. When that happens
//! and the period actually delivered, the request is repeated once without
//! the hourly dimension and reach/frequency are taken from that answer.

use crate::client::{InsightsClient, InsightsRequest};
use crate::debug::{DebugTrail, TrailBuilder};
use adfunnel_core::config::DebugConfig;
use adfunnel_core::types::{coerce_number, stable_sum};
use adfunnel_core::{DiagnosticsSink, FunnelResult, RowTable};
use serde::Serialize;

pub const HOURLY_FALLBACK_REASON: &str = "hourly_breakdown_missing_frequency_or_reach_with_delivery";

/// Delivery totals over a response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DeliverySummary {
    pub impressions: i64,
    pub spend: f64,
    pub reach: i64,
    pub frequency: f64,
}

impl DeliverySummary {
    pub fn from_rows(rows: &RowTable) -> Self {
        let reach = rows.sum_column_int("reach");
        Self {
            impressions: rows.sum_column_int("impressions"),
            spend: rows.sum_column("spend"),
            reach,
            frequency: aggregate_frequency(rows, reach),
        }
    }

    pub fn has_delivery(&self) -> bool {
        self.impressions > 0 || self.spend > 0.0
    }

    pub fn reach_frequency_missing(&self) -> bool {
        self.reach == 0 && self.frequency == 0.0
    }
}

/// A single row reports its own frequency; several rows are combined
/// weighted by reach.
fn aggregate_frequency(rows: &RowTable, reach: i64) -> f64 {
    if rows.len() == 1 {
        return rows.column("frequency").map(coerce_number).sum();
    }
    if reach > 0 {
        let mut weighted: Vec<f64> = rows
            .rows()
            .iter()
            .map(|row| {
                let freq = row.get("frequency").map(coerce_number).unwrap_or(0.0);
                let row_reach = row.get("reach").map(coerce_number).unwrap_or(0.0);
                freq * row_reach
            })
            .collect();
        return stable_sum(&mut weighted) / reach as f64;
    }
    rows.sum_column("frequency")
}

/// Outcome of one insights fetch.
#[derive(Debug, Clone)]
pub struct InsightsFetch {
    /// Rows of the first response, hourly slices included.
    pub rows: RowTable,
    /// Delivery totals; reach and frequency come from the fallback request
    /// when it fired.
    pub summary: DeliverySummary,
    pub debug: DebugTrail,
}

impl InsightsFetch {
    pub fn used_fallback(&self) -> bool {
        self.debug.fallback_reason.is_some()
    }
}

pub fn fetch_insights(
    client: &dyn InsightsClient,
    request: &InsightsRequest,
    debug_config: &DebugConfig,
    sink: &dyn DiagnosticsSink,
) -> FunnelResult<InsightsFetch> {
    let mut trail = TrailBuilder::new(debug_config);

    trail.record_request(request);
    let first = client.fetch(request)?;
    trail.record_sample(first.rows.first());

    let mut summary = DeliverySummary::from_rows(&first.rows);

    if request.is_hourly() && summary.reach_frequency_missing() {
        if summary.has_delivery() {
            sink.warn(&format!(
                "hourly breakdown returned reach=0 frequency=0 with impressions={} spend={:.2}; retrying without hourly breakdown",
                summary.impressions, summary.spend
            ));
            trail.set_fallback_reason(HOURLY_FALLBACK_REASON);

            let retry = request.without_hourly_breakdown();
            trail.record_request(&retry);
            let second = client.fetch(&retry)?;

            let fallback = DeliverySummary::from_rows(&second.rows);
            summary.reach = fallback.reach;
            summary.frequency = fallback.frequency;
        } else {
            sink.debug("hourly breakdown reported no delivery; zero reach and frequency kept");
        }
    }

    Ok(InsightsFetch {
        rows: first.rows,
        summary,
        debug: trail.finish(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_summary_single_row() {
        let rows = RowTable::from_json(&json!([
            {"impressions": "1000", "reach": "400", "frequency": "2.5", "spend": "12.30"}
        ]));
        let s = DeliverySummary::from_rows(&rows);
        assert_eq!(s.impressions, 1000);
        assert_eq!(s.reach, 400);
        assert_eq!(s.frequency, 2.5);
        assert!(s.has_delivery());
        assert!(!s.reach_frequency_missing());
    }

    #[test]
    fn test_summary_weighted_frequency() {
        let rows = RowTable::from_json(&json!([
            {"reach": 100, "frequency": 1.0},
            {"reach": 300, "frequency": 3.0}
        ]));
        let s = DeliverySummary::from_rows(&rows);
        assert_eq!(s.reach, 400);
        assert!((s.frequency - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_spend_alone_counts_as_delivery() {
        let rows = RowTable::from_json(&json!([
            {"impressions": "0", "reach": "0", "frequency": "0", "spend": "3.10"}
        ]));
        let s = DeliverySummary::from_rows(&rows);
        assert!(s.has_delivery());
        assert!(s.reach_frequency_missing());
    }

    #[test]
    fn test_empty_response_has_no_delivery() {
        let s = DeliverySummary::from_rows(&RowTable::default());
        assert!(!s.has_delivery());
        assert!(s.reach_frequency_missing());
    }
}
