//! Action-type diagnostics: everything the ads API reported, not only the
//! types the vocabulary knows about. Used when an expected conversion never
//! shows up in the funnel.

use crate::aggregate::ActionTotals;
use adfunnel_core::vocabulary::{ACTIVATE, INSTALL, STORE_CLICK};
use adfunnel_core::{ActionVocabulary, DiagnosticsSink};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionTypeDiagnostics {
    pub all_action_types: BTreeMap<String, i64>,
    pub install_actions: BTreeMap<String, i64>,
    pub store_actions: BTreeMap<String, i64>,
    pub activate_actions: BTreeMap<String, i64>,
    pub has_install: bool,
    pub has_store: bool,
    pub has_activate: bool,
    pub total_types: usize,
}

/// Total per observed action type across all cells, sorted by type name.
/// Warns through `sink` when no action was reported at all.
pub fn collect_all_action_types<'a, I>(cells: I, sink: &dyn DiagnosticsSink) -> BTreeMap<String, i64>
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut totals = ActionTotals::new();
    for cell in cells {
        totals.add_cell(cell, |_| true);
    }
    if totals.is_empty() {
        sink.warn("no action types found in any row of the actions column");
    }
    totals.per_type()
}

/// Full breakdown plus per-category views and presence flags. Emits one
/// warning per known category that has no observed type.
pub fn collect_action_type_diagnostics<'a, I>(
    cells: I,
    vocabulary: &ActionVocabulary,
    sink: &dyn DiagnosticsSink,
) -> ActionTypeDiagnostics
where
    I: IntoIterator<Item = &'a Value>,
{
    let all_action_types = collect_all_action_types(cells, sink);

    let pick = |category: &str| -> BTreeMap<String, i64> {
        all_action_types
            .iter()
            .filter(|(action_type, _)| vocabulary.contains(category, action_type))
            .map(|(action_type, total)| (action_type.clone(), *total))
            .collect()
    };
    let install_actions = pick(INSTALL);
    let store_actions = pick(STORE_CLICK);
    let activate_actions = pick(ACTIVATE);

    for (category, found) in [
        (INSTALL, &install_actions),
        (STORE_CLICK, &store_actions),
        (ACTIVATE, &activate_actions),
    ] {
        if found.is_empty() && !all_action_types.is_empty() {
            sink.warn(&format!(
                "no '{}' action types reported; expected one of: {}",
                category,
                vocabulary
                    .types(category)
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
    }

    ActionTypeDiagnostics {
        has_install: !install_actions.is_empty(),
        has_store: !store_actions.is_empty(),
        has_activate: !activate_actions.is_empty(),
        total_types: all_action_types.len(),
        all_action_types,
        install_actions,
        store_actions,
        activate_actions,
    }
}
