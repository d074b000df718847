//! Funnel assembly: the four fixed stages shown to the end user:
//! impressions -> link clicks -> store clicks -> installs.

use crate::fallback::{resolve_installs, resolve_link_clicks_with_source, resolve_store_clicks};
use adfunnel_core::{ActionVocabulary, DiagnosticsSink, RowTable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const STAGE_LABELS: [&str; 4] = [
    "Viram o anúncio",
    "Clicaram no anúncio",
    "Foram para a loja do app",
    "Instalaram o app (SDK)",
];

/// Stage values as the dashboard hands them over. Missing keys read as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunnelInputs {
    #[serde(rename = "impressoes", default)]
    pub impressions: i64,
    #[serde(rename = "cliques_link", default)]
    pub link_clicks: i64,
    #[serde(rename = "store_clicks_meta", default)]
    pub store_clicks: i64,
    #[serde(rename = "instalacoes_sdk", default)]
    pub installs: i64,
}

impl FunnelInputs {
    fn values(&self) -> [i64; 4] {
        [
            self.impressions,
            self.link_clicks,
            self.store_clicks,
            self.installs,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelChart {
    pub labels: Vec<String>,
    pub values: Vec<i64>,
}

impl FunnelChart {
    /// `values[i + 1] / values[i]` for each consecutive pair; 0 when the
    /// earlier stage is 0.
    pub fn conversion_rates(&self) -> Vec<f64> {
        self.values
            .windows(2)
            .map(|pair| {
                if pair[0] > 0 {
                    pair[1] as f64 / pair[0] as f64
                } else {
                    0.0
                }
            })
            .collect()
    }
}

/// Fixed labels, values taken positionally. Never reordered by data.
pub fn build_funnel(inputs: &FunnelInputs) -> FunnelChart {
    FunnelChart {
        labels: STAGE_LABELS.iter().map(|l| l.to_string()).collect(),
        values: inputs.values().to_vec(),
    }
}

/// Funnel inputs computed from an ads row table, with the source each
/// stage was taken from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunnelReport {
    pub inputs: FunnelInputs,
    pub sources: BTreeMap<String, String>,
}

impl FunnelReport {
    pub fn from_table(
        table: &RowTable,
        vocabulary: &ActionVocabulary,
        sdk_installs: Option<i64>,
        sink: &dyn DiagnosticsSink,
    ) -> Self {
        let link_clicks = resolve_link_clicks_with_source(table, sink);
        let store_clicks = resolve_store_clicks(table, vocabulary, sink);
        let installs = resolve_installs(table, vocabulary, sdk_installs, sink);

        let inputs = FunnelInputs {
            impressions: table.sum_column_int("impressions"),
            link_clicks: link_clicks.value,
            store_clicks: store_clicks.value,
            installs: installs.value,
        };

        let mut sources = BTreeMap::new();
        sources.insert("impressions".to_string(), "impressions".to_string());
        sources.insert("link_clicks".to_string(), link_clicks.source);
        sources.insert("store_clicks".to_string(), store_clicks.source);
        sources.insert("installs".to_string(), installs.source);

        Self { inputs, sources }
    }

    pub fn chart(&self) -> FunnelChart {
        build_funnel(&self.inputs)
    }
}
