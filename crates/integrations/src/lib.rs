//! Ads platform integration: insights fetching, the hourly-breakdown
//! fallback, and the redacted request trail.

pub mod client;
pub mod debug;
pub mod graph;
pub mod hourly;

pub use client::{InsightsClient, InsightsRequest, InsightsResponse, HOURLY_BREAKDOWN};
pub use debug::{DebugTrail, TrailBuilder};
pub use graph::GraphApiClient;
pub use hourly::{fetch_insights, DeliverySummary, InsightsFetch, HOURLY_FALLBACK_REASON};
