//! Action aggregation across rows.
//!
//! Both the targeted sum and the full per-type breakdown go through
//! [`ActionTotals`], so they can never disagree on parsing or rounding.

use crate::actions::parse_action_cell;
use adfunnel_core::types::stable_sum;
use adfunnel_core::{ActionVocabulary, RowTable};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Sum of matching action values plus whether anything matched at all.
///
/// `found_type == false` always comes with `total == 0`; a matching record
/// that reported zero gives `found_type == true, total == 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationResult {
    pub total: i64,
    pub found_type: bool,
}

/// Per-type value accumulator. Values are kept until the end and summed in
/// a canonical order, so row order never changes the result.
#[derive(Debug, Default)]
pub struct ActionTotals {
    values: BTreeMap<String, Vec<f64>>,
}

impl ActionTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw cell and record every action whose type passes `keep`.
    pub fn add_cell<F>(&mut self, raw: &Value, keep: F)
    where
        F: Fn(&str) -> bool,
    {
        for record in parse_action_cell(raw) {
            if keep(&record.action_type) {
                self.values
                    .entry(record.action_type)
                    .or_default()
                    .push(record.value);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Integer total per observed type, sorted by type name.
    pub fn per_type(&self) -> BTreeMap<String, i64> {
        self.values
            .iter()
            .map(|(action_type, values)| {
                let mut values = values.clone();
                (action_type.clone(), stable_sum(&mut values).round() as i64)
            })
            .collect()
    }

    /// Grand total over every recorded type.
    pub fn result(&self) -> AggregationResult {
        let mut all: Vec<f64> = self.values.values().flatten().copied().collect();
        AggregationResult {
            total: stable_sum(&mut all).round() as i64,
            found_type: !self.values.is_empty(),
        }
    }
}

/// Sum action values across `cells` for every action type in
/// `target_types`.
pub fn sum_actions_by_types<'a, I>(cells: I, target_types: &BTreeSet<String>) -> AggregationResult
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut totals = ActionTotals::new();
    for cell in cells {
        totals.add_cell(cell, |action_type| target_types.contains(action_type));
    }
    totals.result()
}

/// [`sum_actions_by_types`] over a table's `actions` column for one
/// vocabulary category.
pub fn sum_category(
    table: &RowTable,
    vocabulary: &ActionVocabulary,
    category: &str,
) -> AggregationResult {
    sum_actions_by_types(table.action_cells(), vocabulary.types(category))
}

/// [`sum_actions_by_types`] for a single action type.
pub fn sum_action_type(table: &RowTable, action_type: &str) -> AggregationResult {
    let targets = BTreeSet::from([action_type.to_string()]);
    sum_actions_by_types(table.action_cells(), &targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use adfunnel_core::vocabulary::STORE_CLICK;
    use serde_json::json;

    fn targets(types: &[&str]) -> BTreeSet<String> {
        types.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_sums_matching_types_only() {
        let cells = vec![
            json!([{"action_type": "app_store_click", "value": "45"},
                   {"action_type": "link_click", "value": "100"}]),
            json!([{"action_type": "store_click", "value": "5"}]),
        ];
        let result = sum_actions_by_types(&cells, &targets(&["app_store_click", "store_click"]));
        assert_eq!(result, AggregationResult { total: 50, found_type: true });
    }

    #[test]
    fn test_found_but_zero_differs_from_absent() {
        let zero = vec![json!([{"action_type": "store_click", "value": "0"}])];
        let absent = vec![json!([{"action_type": "link_click", "value": "3"}])];
        let set = targets(&["store_click"]);

        assert_eq!(
            sum_actions_by_types(&zero, &set),
            AggregationResult { total: 0, found_type: true }
        );
        assert_eq!(
            sum_actions_by_types(&absent, &set),
            AggregationResult { total: 0, found_type: false }
        );
    }

    #[test]
    fn test_unparsable_cells_contribute_nothing() {
        let cells = vec![
            json!(null),
            json!("{{garbage"),
            json!([1, 2, 3]),
            json!([{"action_type": "store_click", "value": "abc"}]),
            json!([{"action_type": "store_click", "value": 2}]),
        ];
        let result = sum_actions_by_types(&cells, &targets(&["store_click"]));
        assert_eq!(result, AggregationResult { total: 2, found_type: true });
    }

    #[test]
    fn test_empty_target_set_never_matches() {
        let cells = vec![json!([{"action_type": "store_click", "value": 2}])];
        assert_eq!(sum_actions_by_types(&cells, &BTreeSet::new()), AggregationResult::default());
    }

    #[test]
    fn test_row_order_does_not_change_result() {
        let cells = vec![
            json!([{"action_type": "store_click", "value": "0.1"}]),
            json!([{"action_type": "store_click", "value": 1e15}]),
            json!([{"action_type": "store_click", "value": "0.2"}]),
            json!([{"action_type": "app_store_click", "value": "0.3"}]),
            json!(null),
        ];
        let set = targets(&["store_click", "app_store_click"]);
        let expected = sum_actions_by_types(&cells, &set);

        // Every rotation and the reversal of the rows.
        for shift in 0..cells.len() {
            let mut rotated = cells.clone();
            rotated.rotate_left(shift);
            assert_eq!(sum_actions_by_types(&rotated, &set), expected);
            rotated.reverse();
            assert_eq!(sum_actions_by_types(&rotated, &set), expected);
        }
    }

    #[test]
    fn test_rounds_once_at_the_end() {
        let cells = vec![
            json!([{"action_type": "store_click", "value": "0.4"}]),
            json!([{"action_type": "store_click", "value": "0.4"}]),
        ];
        // 0.4 + 0.4 = 0.8 -> 1, not round(0.4) + round(0.4) = 0.
        assert_eq!(sum_actions_by_types(&cells, &targets(&["store_click"])).total, 1);
    }

    #[test]
    fn test_sum_category_uses_vocabulary() {
        let table = RowTable::from_json(&json!([
            {"actions": [{"action_type": "mobile_app_store_click", "value": 7}]},
            {"actions": [{"action_type": "link_click", "value": 70}]}
        ]));
        let vocab = ActionVocabulary::builtin();
        assert_eq!(
            sum_category(&table, &vocab, STORE_CLICK),
            AggregationResult { total: 7, found_type: true }
        );
        assert_eq!(
            sum_action_type(&table, "link_click"),
            AggregationResult { total: 70, found_type: true }
        );
    }

    #[test]
    fn test_per_type_breakdown_is_sorted() {
        let mut totals = ActionTotals::new();
        totals.add_cell(&json!([{"action_type": "video_view", "value": 3},
                                {"action_type": "link_click", "value": "2"}]), |_| true);
        totals.add_cell(&json!({"action_type": "link_click", "value": 4}), |_| true);

        let per_type: Vec<(String, i64)> = totals.per_type().into_iter().collect();
        assert_eq!(
            per_type,
            vec![("link_click".to_string(), 6), ("video_view".to_string(), 3)]
        );
    }
}
