use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Column holding the encoded action collection of a row.
pub const ACTIONS_COLUMN: &str = "actions";

static NULL: Value = Value::Null;

/// One row returned by the ads reporting API: column name -> raw value.
pub type Row = Map<String, Value>;

/// Ordered rows as returned by the upstream service. Never mutated after
/// construction; every derived value lives in a new structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowTable {
    rows: Vec<Row>,
}

impl RowTable {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Build a table from a JSON array. Elements that are not objects are
    /// skipped; anything other than an array yields an empty table.
    pub fn from_json(value: &Value) -> Self {
        let rows = match value {
            Value::Array(items) => items
                .iter()
                .filter_map(|item| item.as_object().cloned())
                .collect(),
            _ => Vec::new(),
        };
        Self { rows }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    /// Raw cells of one column, one per row. Rows without the column yield
    /// `Value::Null` so positions line up with rows.
    pub fn column<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.rows
            .iter()
            .map(move |row| row.get(name).unwrap_or(&NULL))
    }

    /// Raw `actions` cells, one per row.
    pub fn action_cells(&self) -> impl Iterator<Item = &Value> + '_ {
        self.column(ACTIONS_COLUMN)
    }

    /// Sum a scalar column as floats. Missing, null, and non-numeric cells
    /// count as zero.
    pub fn sum_column(&self, name: &str) -> f64 {
        let mut values: Vec<f64> = self.column(name).map(coerce_number).collect();
        stable_sum(&mut values)
    }

    /// Integer form of [`RowTable::sum_column`], rounded once at the end.
    pub fn sum_column_int(&self, name: &str) -> i64 {
        self.sum_column(name).round() as i64
    }
}

impl From<Vec<Row>> for RowTable {
    fn from(rows: Vec<Row>) -> Self {
        Self::new(rows)
    }
}

/// Lenient numeric coercion for upstream cells: JSON numbers and numeric
/// text are accepted, everything else (and non-finite results) is 0.
pub fn coerce_number(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Order-independent float sum: values are summed in ascending order so the
/// result does not depend on the order rows arrived in.
pub fn stable_sum(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    values.iter().sum()
}
