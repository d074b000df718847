//! Fallback resolution. Picks, per funnel quantity, the first data source
//! that carries a real signal.
//!
//! A chain is an ordered list of tiers, each a source name, a compute
//! function over the row table, and an acceptance predicate, ending in a
//! catch-all tier that is accepted whatever it computes. Every rejected tier
//! is reported to the diagnostics sink so a funnel number can always be
//! traced back to where it came from.

use crate::aggregate::{sum_action_type, sum_category, AggregationResult};
use adfunnel_core::vocabulary::{INSTALL, LINK_CLICK_TYPE, STORE_CLICK};
use adfunnel_core::{ActionVocabulary, DiagnosticsSink, RowTable};
use serde::{Deserialize, Serialize};

pub const SOURCE_ACTIONS: &str = "actions";
pub const SOURCE_INLINE_LINK_CLICKS: &str = "inline_link_clicks";
pub const SOURCE_ACTIONS_LINK_CLICK: &str = "actions.link_click";
pub const SOURCE_CLICKS: &str = "clicks";
pub const SOURCE_SDK: &str = "sdk";
pub const SOURCE_NONE: &str = "none";

/// A resolved value and the tier that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackResolution {
    pub value: i64,
    pub source: String,
}

type Compute<'a> = Box<dyn Fn(&RowTable) -> AggregationResult + 'a>;

/// Acceptance predicate for a tier's computed signal.
pub type Accept = fn(&AggregationResult) -> bool;

/// At least one matching record, whatever its value. Column tiers that
/// need a positive sum encode that in `found_type` themselves.
pub fn found_signal(result: &AggregationResult) -> bool {
    result.found_type
}

struct Tier<'a> {
    source: &'static str,
    accept: Accept,
    reject_reason: &'static str,
    compute: Compute<'a>,
}

pub struct FallbackChain<'a> {
    quantity: &'static str,
    tiers: Vec<Tier<'a>>,
    catch_all: Tier<'a>,
}

impl<'a> FallbackChain<'a> {
    /// Start a chain for `quantity` that ends in `catch_all_source`.
    pub fn new<F>(quantity: &'static str, catch_all_source: &'static str, catch_all: F) -> Self
    where
        F: Fn(&RowTable) -> AggregationResult + 'a,
    {
        Self {
            quantity,
            tiers: Vec::new(),
            catch_all: Tier {
                source: catch_all_source,
                accept: |_| true,
                reject_reason: "",
                compute: Box::new(catch_all),
            },
        }
    }

    /// Append a tier, tried after every tier added before it.
    pub fn tier<F>(
        mut self,
        source: &'static str,
        accept: Accept,
        reject_reason: &'static str,
        compute: F,
    ) -> Self
    where
        F: Fn(&RowTable) -> AggregationResult + 'a,
    {
        self.tiers.push(Tier {
            source,
            accept,
            reject_reason,
            compute: Box::new(compute),
        });
        self
    }

    /// Source names in evaluation order, catch-all last.
    pub fn sources(&self) -> Vec<&'static str> {
        self.tiers
            .iter()
            .chain(std::iter::once(&self.catch_all))
            .map(|t| t.source)
            .collect()
    }

    pub fn resolve(&self, table: &RowTable, sink: &dyn DiagnosticsSink) -> FallbackResolution {
        for tier in &self.tiers {
            let result = (tier.compute)(table);
            if (tier.accept)(&result) {
                return self.resolved(tier.source, result.total, sink);
            }
            sink.warn(&format!(
                "{}: skipping '{}' tier ({}; total={}, found={})",
                self.quantity, tier.source, tier.reject_reason, result.total, result.found_type
            ));
        }
        let result = (self.catch_all.compute)(table);
        self.resolved(self.catch_all.source, result.total, sink)
    }

    fn resolved(
        &self,
        source: &'static str,
        value: i64,
        sink: &dyn DiagnosticsSink,
    ) -> FallbackResolution {
        sink.debug(&format!("{} resolved from '{}' = {}", self.quantity, source, value));
        FallbackResolution {
            value,
            source: source.to_string(),
        }
    }
}

fn column_signal(table: &RowTable, column: &str) -> AggregationResult {
    AggregationResult {
        total: table.sum_column_int(column),
        found_type: table.column(column).any(|cell| !cell.is_null()),
    }
}

/// Like [`column_signal`], but `found_type` is only set when the raw sum is
/// strictly positive. Checked before rounding so 0.4 still counts.
fn positive_column_signal(table: &RowTable, column: &str) -> AggregationResult {
    let raw = table.sum_column(column);
    AggregationResult {
        total: raw.round() as i64,
        found_type: raw > 0.0,
    }
}

/// actions(store_click) -> inline_link_clicks (> 0) -> actions(link_click) -> clicks
pub fn store_clicks_chain(vocabulary: &ActionVocabulary) -> FallbackChain<'_> {
    FallbackChain::new("store_clicks", SOURCE_CLICKS, |t| column_signal(t, "clicks"))
        .tier(
            SOURCE_ACTIONS,
            found_signal,
            "no store-click action types reported",
            move |t| sum_category(t, vocabulary, STORE_CLICK),
        )
        .tier(
            SOURCE_INLINE_LINK_CLICKS,
            found_signal,
            "inline_link_clicks sums to zero",
            |t| positive_column_signal(t, "inline_link_clicks"),
        )
        .tier(
            SOURCE_ACTIONS_LINK_CLICK,
            found_signal,
            "no link_click actions reported",
            |t| sum_action_type(t, LINK_CLICK_TYPE),
        )
}

/// inline_link_clicks (> 0) -> actions(link_click) -> clicks
pub fn link_clicks_chain<'a>() -> FallbackChain<'a> {
    FallbackChain::new("link_clicks", SOURCE_CLICKS, |t| column_signal(t, "clicks"))
        .tier(
            SOURCE_INLINE_LINK_CLICKS,
            found_signal,
            "inline_link_clicks sums to zero",
            |t| positive_column_signal(t, "inline_link_clicks"),
        )
        .tier(
            SOURCE_ACTIONS_LINK_CLICK,
            found_signal,
            "no link_click actions reported",
            |t| sum_action_type(t, LINK_CLICK_TYPE),
        )
}

/// sdk (when reported) -> actions(install) -> none
pub fn installs_chain(vocabulary: &ActionVocabulary, sdk_installs: Option<i64>) -> FallbackChain<'_> {
    FallbackChain::new("installs", SOURCE_NONE, |_| AggregationResult::default())
        .tier(
            SOURCE_SDK,
            found_signal,
            "analytics SDK reported no install count",
            move |_| AggregationResult {
                total: sdk_installs.unwrap_or(0),
                found_type: sdk_installs.is_some(),
            },
        )
        .tier(
            SOURCE_ACTIONS,
            found_signal,
            "no install action types reported",
            move |t| sum_category(t, vocabulary, INSTALL),
        )
}

pub fn resolve_store_clicks(
    table: &RowTable,
    vocabulary: &ActionVocabulary,
    sink: &dyn DiagnosticsSink,
) -> FallbackResolution {
    store_clicks_chain(vocabulary).resolve(table, sink)
}

pub fn resolve_link_clicks_with_source(
    table: &RowTable,
    sink: &dyn DiagnosticsSink,
) -> FallbackResolution {
    link_clicks_chain().resolve(table, sink)
}

pub fn resolve_link_clicks(table: &RowTable, sink: &dyn DiagnosticsSink) -> i64 {
    resolve_link_clicks_with_source(table, sink).value
}

pub fn resolve_installs(
    table: &RowTable,
    vocabulary: &ActionVocabulary,
    sdk_installs: Option<i64>,
    sink: &dyn DiagnosticsSink,
) -> FallbackResolution {
    installs_chain(vocabulary, sdk_installs).resolve(table, sink)
}
