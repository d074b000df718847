//! End-to-end funnel reconciliation over row tables shaped like ads API
//! insights responses.

use adfunnel_core::config::VocabularyConfig;
use adfunnel_core::vocabulary::{INSTALL, STORE_CLICK};
use adfunnel_core::{ActionVocabulary, RecordingSink, RowTable};
use adfunnel_reporting::{
    build_funnel, collect_action_type_diagnostics, resolve_link_clicks, resolve_store_clicks,
    sum_actions_by_types, AggregationResult, FunnelInputs, FunnelReport,
};
use serde_json::{json, Value};

fn table(value: Value) -> RowTable {
    RowTable::from_json(&value)
}

#[test]
fn store_clicks_scenarios() {
    let vocab = ActionVocabulary::builtin();
    let sink = RecordingSink::new();

    let from_actions = table(json!([
        {"actions": [{"action_type": "app_store_click", "value": "45"}]},
        {"actions": [{"action_type": "store_click", "value": "5"}]}
    ]));
    let res = resolve_store_clicks(&from_actions, &vocab, &sink);
    assert_eq!((res.value, res.source.as_str()), (50, "actions"));

    let from_inline = table(json!([
        {"actions": [{"action_type": "link_click", "value": "90"}], "inline_link_clicks": "100"},
        {"inline_link_clicks": "200"}
    ]));
    let res = resolve_store_clicks(&from_inline, &vocab, &sink);
    assert_eq!((res.value, res.source.as_str()), (300, "inline_link_clicks"));

    let from_link_click = table(json!([
        {"actions": [{"action_type": "link_click", "value": "15"}], "inline_link_clicks": "0"},
        {"actions": [{"action_type": "link_click", "value": "5"}], "inline_link_clicks": 0}
    ]));
    let res = resolve_store_clicks(&from_link_click, &vocab, &sink);
    assert_eq!((res.value, res.source.as_str()), (20, "actions.link_click"));
}

#[test]
fn malformed_rows_never_abort_aggregation() {
    let t = table(json!([
        {"actions": "{not json", "clicks": "abc"},
        {"actions": [null, 4, "x", {"action_type": "store_click", "value": "oops"}]},
        {"actions": 17},
        {"actions": {"action_type": "app_store_click", "value": "3"}},
        {"clicks": null}
    ]));
    let vocab = ActionVocabulary::builtin();
    let result = sum_actions_by_types(t.action_cells(), vocab.types(STORE_CLICK));
    assert_eq!(result, AggregationResult { total: 3, found_type: true });

    assert_eq!(resolve_link_clicks(&t, &RecordingSink::new()), 0);
}

#[test]
fn not_found_implies_zero_for_every_category() {
    let t = table(json!([
        {"actions": [{"action_type": "video_view", "value": "300"}, {"action_type": "post_engagement", "value": 12}]},
        {"actions": "[]"}
    ]));
    let vocab = ActionVocabulary::builtin();
    for category in vocab.category_names() {
        let result = sum_actions_by_types(t.action_cells(), vocab.types(category));
        assert!(!result.found_type);
        assert_eq!(result.total, 0);
    }
}

#[test]
fn configured_synonyms_flow_into_resolution() {
    let mut config = VocabularyConfig::default();
    config
        .categories
        .insert(STORE_CLICK.to_string(), vec!["onsite_app_store_visit".to_string()]);
    let vocab = ActionVocabulary::from_config(&config);

    let t = table(json!([
        {"actions": [{"action_type": "onsite_app_store_visit", "value": "11"}], "inline_link_clicks": "99"}
    ]));
    let res = resolve_store_clicks(&t, &vocab, &RecordingSink::new());
    assert_eq!((res.value, res.source.as_str()), (11, "actions"));

    let builtin = resolve_store_clicks(&t, &ActionVocabulary::builtin(), &RecordingSink::new());
    assert_eq!(builtin.source, "inline_link_clicks");
}

#[test]
fn report_and_diagnostics_agree() {
    let t = table(json!([
        {
            "impressions": "5000",
            "clicks": "260",
            "inline_link_clicks": "0",
            "actions": [
                {"action_type": "link_click", "value": "240"},
                {"action_type": "app_custom_event.fb_mobile_install", "value": "9"}
            ]
        },
        {
            "impressions": "1000",
            "clicks": "40",
            "actions": "[{\"action_type\":\"link_click\",\"value\":\"30\"},{\"action_type\":\"mobile_app_install\",\"value\":\"3\"}]"
        }
    ]));
    let vocab = ActionVocabulary::builtin();
    let sink = RecordingSink::new();

    let report = FunnelReport::from_table(&t, &vocab, None, &sink);
    assert_eq!(
        report.inputs,
        FunnelInputs {
            impressions: 6000,
            link_clicks: 270,
            store_clicks: 270,
            installs: 12,
        }
    );
    assert_eq!(report.sources["store_clicks"], "actions.link_click");
    assert_eq!(report.sources["link_clicks"], "actions.link_click");

    let diag = collect_action_type_diagnostics(t.action_cells(), &vocab, &sink);
    assert!(diag.has_install);
    assert!(!diag.has_store);
    assert_eq!(diag.install_actions.values().sum::<i64>(), report.inputs.installs);
    assert_eq!(
        sum_actions_by_types(t.action_cells(), vocab.types(INSTALL)).total,
        report.inputs.installs
    );

    let chart = build_funnel(&report.inputs);
    assert_eq!(chart.values, vec![6000, 270, 270, 12]);
    assert_eq!(chart.labels[2], "Foram para a loja do app");
}
