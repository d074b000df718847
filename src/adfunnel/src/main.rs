//! adfunnel: reconciles ads-platform insights into the four-stage app
//! install funnel and prints it, with sources and diagnostics, as JSON.

use adfunnel_core::config::AppConfig;
use adfunnel_core::{ActionVocabulary, RowTable, TracingSink};
use adfunnel_integrations::{fetch_insights, DebugTrail, DeliverySummary, GraphApiClient, InsightsRequest};
use adfunnel_reporting::{collect_action_type_diagnostics, ActionTypeDiagnostics, FunnelChart, FunnelReport};
use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "adfunnel")]
#[command(about = "Ads funnel reconciliation: impressions, link clicks, store clicks, installs")]
#[command(version)]
struct Cli {
    /// TOML configuration file (environment variables still override it)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reconcile a saved insights response (a JSON array of rows, or an
    /// object with a `data` array)
    Report {
        #[arg(long)]
        rows: PathBuf,

        /// Installs reported by the analytics SDK for the same period
        #[arg(long)]
        sdk_installs: Option<i64>,
    },
    /// Fetch insights from the ads API and reconcile them
    Fetch {
        #[arg(long)]
        account_id: String,

        /// First day, YYYY-MM-DD
        #[arg(long)]
        since: NaiveDate,

        /// Last day, YYYY-MM-DD
        #[arg(long)]
        until: NaiveDate,

        /// Slice the request by advertiser-time-zone hour
        #[arg(long, default_value_t = false)]
        hourly: bool,

        #[arg(long)]
        sdk_installs: Option<i64>,
    },
}

#[derive(Serialize)]
struct Output {
    funnel: FunnelChart,
    conversion_rates: Vec<f64>,
    sources: BTreeMap<String, String>,
    diagnostics: ActionTypeDiagnostics,
    #[serde(skip_serializing_if = "Option::is_none")]
    delivery: Option<DeliverySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    debug: Option<DebugTrail>,
}

fn main() -> anyhow::Result<()> {
    // stdout carries the report, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adfunnel=info".into()),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => AppConfig::load(Some(path))
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => AppConfig::load(None).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config, using defaults");
            AppConfig::default()
        }),
    };

    let vocabulary = ActionVocabulary::from_config(&config.vocabulary);
    let sink = TracingSink;

    info!(
        categories = vocabulary.category_names().count(),
        timeout_ms = config.ads_api.timeout_ms,
        "Configuration loaded"
    );

    let output = match cli.command {
        Command::Report { rows, sdk_installs } => {
            let table = load_rows(&rows)?;
            info!(rows = table.len(), "Loaded insights rows");
            build_output(&table, &vocabulary, sdk_installs, None, None)
        }
        Command::Fetch {
            account_id,
            since,
            until,
            hourly,
            sdk_installs,
        } => {
            if config.ads_api.access_token.is_empty() {
                anyhow::bail!("ADFUNNEL__ADS_API__ACCESS_TOKEN is not set");
            }
            let mut request =
                InsightsRequest::new(account_id, config.ads_api.access_token.clone(), since, until);
            if hourly {
                request = request.with_hourly_breakdown();
            }

            let client = GraphApiClient::new(&config.ads_api)?;
            let fetch = fetch_insights(&client, &request, &config.debug, &sink)?;
            info!(
                rows = fetch.rows.len(),
                fallback = fetch.used_fallback(),
                "Fetched insights"
            );
            build_output(
                &fetch.rows,
                &vocabulary,
                sdk_installs,
                Some(fetch.summary),
                Some(fetch.debug),
            )
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn load_rows(path: &Path) -> anyhow::Result<RowTable> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    let rows = match value.get("data") {
        Some(data) => data,
        None => &value,
    };
    Ok(RowTable::from_json(rows))
}

fn build_output(
    table: &RowTable,
    vocabulary: &ActionVocabulary,
    sdk_installs: Option<i64>,
    delivery: Option<DeliverySummary>,
    debug: Option<DebugTrail>,
) -> Output {
    let sink = TracingSink;
    let report = FunnelReport::from_table(table, vocabulary, sdk_installs, &sink);
    let funnel = report.chart();
    Output {
        conversion_rates: funnel.conversion_rates(),
        funnel,
        sources: report.sources,
        diagnostics: collect_action_type_diagnostics(table.action_cells(), vocabulary, &sink),
        delivery,
        debug,
    }
}
