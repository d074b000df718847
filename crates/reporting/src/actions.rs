//! Action cell decoding. Turns one row's `actions` payload, whatever shape
//! the ads API returned it in, into a uniform list of [`ActionRecord`]s.

use adfunnel_core::types::coerce_number;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const UNKNOWN_ACTION_TYPE: &str = "unknown";

/// One (event type, value) pair reported for a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub action_type: String,
    pub value: f64,
}

impl ActionRecord {
    fn from_mapping(mapping: &Map<String, Value>) -> Self {
        let action_type = match mapping.get("action_type") {
            Some(Value::String(s)) => s.clone(),
            None | Some(Value::Null) => UNKNOWN_ACTION_TYPE.to_string(),
            Some(other) => other.to_string(),
        };
        let value = mapping.get("value").map(coerce_number).unwrap_or(0.0);
        Self { action_type, value }
    }
}

/// The shapes an `actions` cell shows up in.
#[derive(Debug, Clone, Copy)]
pub enum ActionCell<'a> {
    /// JSON-encoded text, decoded lazily.
    Text(&'a str),
    Single(&'a Map<String, Value>),
    List(&'a [Value]),
    Empty,
}

impl<'a> ActionCell<'a> {
    pub fn classify(raw: &'a Value) -> Self {
        match raw {
            Value::String(s) => ActionCell::Text(s),
            Value::Object(map) => ActionCell::Single(map),
            Value::Array(items) => ActionCell::List(items),
            _ => ActionCell::Empty,
        }
    }

    pub fn records(self) -> Vec<ActionRecord> {
        match self {
            ActionCell::Text(text) => match serde_json::from_str::<Value>(text) {
                // One level only: text that decodes to more text is garbage.
                Ok(decoded @ (Value::Object(_) | Value::Array(_))) => {
                    ActionCell::classify(&decoded).records()
                }
                _ => Vec::new(),
            },
            ActionCell::Single(map) => vec![ActionRecord::from_mapping(map)],
            ActionCell::List(items) => items
                .iter()
                .filter_map(Value::as_object)
                .map(ActionRecord::from_mapping)
                .collect(),
            ActionCell::Empty => Vec::new(),
        }
    }
}

/// Decode one raw `actions` cell. Never fails: anything unreadable is an
/// empty list.
pub fn parse_action_cell(raw: &Value) -> Vec<ActionRecord> {
    ActionCell::classify(raw).records()
}
