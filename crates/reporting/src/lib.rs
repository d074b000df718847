//! Funnel reconciliation: decodes ads-platform action payloads, aggregates
//! them, and resolves each funnel stage through an explicit fallback chain.

pub mod actions;
pub mod aggregate;
pub mod diagnostics;
pub mod fallback;
pub mod funnel;

pub use actions::{parse_action_cell, ActionRecord};
pub use aggregate::{sum_actions_by_types, AggregationResult};
pub use diagnostics::{collect_action_type_diagnostics, collect_all_action_types, ActionTypeDiagnostics};
pub use fallback::{
    resolve_installs, resolve_link_clicks, resolve_link_clicks_with_source, resolve_store_clicks,
    FallbackChain, FallbackResolution,
};
pub use funnel::{build_funnel, FunnelChart, FunnelInputs, FunnelReport};
