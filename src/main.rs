//! adscope - competitive ad strategy signals
//!
//! Ranks forecast changes in competitors' advertising strategy from weekly
//! metric samples.
//!
//! # Usage
//!
//! ```bash
//! # Rank every entity in a samples file as of a week
//! adscope rank --samples samples.jsonl --as-of 2024-10-07
//!
//! # Two entities, shorter horizon, narratives from a local service
//! adscope rank --samples samples.jsonl --as-of 2024-10-07 \
//!     --entity acme --entity globex --horizon 2 \
//!     --narrate-endpoint http://localhost:9000/narrate
//!
//! # Week-by-week forecast path for one metric
//! adscope forecast --samples samples.jsonl --as-of 2024-10-07 \
//!     --entity acme --metric promotional_intensity
//!
//! # Validate a config file
//! adscope check-config --config adscope.toml
//! ```
//!
//! # Environment Variables
//!
//! - `ADSCOPE_CONFIG`: Path to the engine config TOML
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use adscope::config::{defaults, validation, CONFIG_ENV_VAR, LOCAL_CONFIG_FILE};
use adscope::engine::{ConfidenceClassifier, Forecaster, TrendEstimator};
use adscope::{
    EngineConfig, EntityId, HttpNarrativeBackend, MetricName, MetricSeriesStore,
    NarrativeDispatcher, NarrativeOutcome, NarrativeRequest, RankedSignalSet, SignalEngine,
};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "adscope")]
#[command(about = "Competitive ad strategy signal ranking")]
#[command(version)]
struct CliArgs {
    /// Engine config TOML (takes precedence over ADSCOPE_CONFIG and ./adscope.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Rank the top signals per entity
    Rank {
        /// Samples file (JSON array or JSON lines)
        #[arg(long, value_name = "FILE")]
        samples: PathBuf,
        /// As-of week (a Monday, YYYY-MM-DD)
        #[arg(long)]
        as_of: NaiveDate,
        /// Entity to rank; repeat for several (default: every entity)
        #[arg(long = "entity", value_name = "ID")]
        entities: Vec<EntityId>,
        /// Forecast horizon in weeks
        #[arg(long)]
        horizon: Option<usize>,
        /// Signals kept per entity
        #[arg(long)]
        top_k: Option<usize>,
        /// Trailing trend window in weeks
        #[arg(long)]
        window: Option<usize>,
        /// Write the report here instead of stdout
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Narrative service URL (overrides narrative.endpoint)
        #[arg(long, value_name = "URL")]
        narrate_endpoint: Option<String>,
    },

    /// Print the week-by-week forecast path for one metric
    Forecast {
        #[arg(long, value_name = "FILE")]
        samples: PathBuf,
        #[arg(long)]
        as_of: NaiveDate,
        #[arg(long)]
        entity: EntityId,
        /// Metric name, e.g. promotional_intensity
        #[arg(long)]
        metric: MetricName,
        #[arg(long)]
        horizon: Option<usize>,
    },

    /// Load and validate a config, printing warnings and the effective values
    CheckConfig,
}

// ============================================================================
// Report
// ============================================================================

#[derive(Serialize)]
struct RankReport {
    as_of: NaiveDate,
    horizon: usize,
    top_k: usize,
    samples_accepted: usize,
    samples_rejected: usize,
    entities: BTreeMap<EntityId, RankedSignalSet>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    narratives: Vec<NarrativeOutcome>,
}

// ============================================================================
// Setup
// ============================================================================

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Explicit `--config` first, then the standard search order.
fn resolve_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(p) => EngineConfig::load_from_file(p)
            .with_context(|| format!("Failed to load config {}", p.display())),
        None => Ok(EngineConfig::load()),
    }
}

fn load_store(samples: &Path) -> Result<(MetricSeriesStore, usize, usize)> {
    let (store, report) = MetricSeriesStore::from_samples_file(samples)
        .with_context(|| format!("Failed to load samples from {}", samples.display()))?;
    if store.is_empty() {
        bail!("No valid samples in {}", samples.display());
    }
    Ok((store, report.accepted, report.rejected.len()))
}

fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize report")?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "Report written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

// ============================================================================
// Commands
// ============================================================================

#[allow(clippy::too_many_arguments)]
async fn run_rank(
    mut config: EngineConfig,
    samples: &Path,
    as_of: NaiveDate,
    entities: Vec<EntityId>,
    horizon: Option<usize>,
    top_k: Option<usize>,
    window: Option<usize>,
    output: Option<&Path>,
    narrate_endpoint: Option<String>,
) -> Result<()> {
    if let Some(h) = horizon {
        config.forecast.horizon = h;
    }
    if let Some(k) = top_k {
        config.ranking.top_k = k;
    }
    if let Some(w) = window {
        config.trend.window_size = w;
    }
    if narrate_endpoint.is_some() {
        config.narrative.endpoint = narrate_endpoint;
    }
    config.validate().context("Invalid engine configuration")?;

    let (store, accepted, rejected) = load_store(samples)?;
    if rejected > 0 {
        warn!(rejected, "Some samples were rejected at ingestion");
    }

    let engine = SignalEngine::new(config);
    let ranked = engine
        .compute_with_defaults(&store, &entities, as_of)
        .context("Ranking failed")?;

    let narrative_config = &engine.config().narrative;
    let narratives = match narrative_config.endpoint.as_deref() {
        Some(endpoint) => {
            let backend = HttpNarrativeBackend::new(
                endpoint,
                std::time::Duration::from_secs(narrative_config.timeout_secs),
            )
            .context("Failed to build narrative client")?;
            let dispatcher = NarrativeDispatcher::new(Arc::new(backend), narrative_config);
            info!(endpoint, "Dispatching narrative requests");
            dispatcher.dispatch(NarrativeRequest::from_ranked(&ranked)).await
        }
        None => Vec::new(),
    };

    let report = RankReport {
        as_of,
        horizon: engine.config().forecast.horizon,
        top_k: engine.config().ranking.top_k,
        samples_accepted: accepted,
        samples_rejected: rejected,
        entities: ranked,
        narratives,
    };
    write_json(&report, output)
}

fn run_forecast(
    config: &EngineConfig,
    samples: &Path,
    as_of: NaiveDate,
    entity: &str,
    metric: MetricName,
    horizon: Option<usize>,
) -> Result<()> {
    if metric.is_categorical() {
        bail!("{metric} is categorical and has no numeric forecast");
    }
    let horizon = horizon.unwrap_or(config.forecast.horizon);
    if !(1..=defaults::MAX_FORECAST_HORIZON).contains(&horizon) {
        bail!(
            "--horizon must be in 1..={}, got {horizon}",
            defaults::MAX_FORECAST_HORIZON
        );
    }

    let (store, _, _) = load_store(samples)?;
    let trend = TrendEstimator::new(config.trend.window_size)
        .estimate(&store, entity, metric, as_of)
        .with_context(|| format!("Cannot estimate trend for {entity}/{metric}"))?;
    let current = store.numeric_value(entity, metric, as_of);
    let confidence = ConfidenceClassifier::classify(
        metric,
        trend.slope_stddev,
        current.unwrap_or(0.0),
        &config.family(metric.family()).confidence,
    );
    let path = Forecaster::new(&config.forecast)
        .project_path(&trend, current, horizon, confidence)
        .context("Forecast failed")?;

    write_json(
        &serde_json::json!({
            "trend": trend,
            "current_value": current,
            "path": path,
        }),
        None,
    )
}

fn run_check_config(explicit: Option<&Path>) -> Result<()> {
    let source: Option<PathBuf> = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from))
        .or_else(|| {
            let local = PathBuf::from(LOCAL_CONFIG_FILE);
            local.exists().then_some(local)
        });

    let config = match &source {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let warnings = validation::validate_unknown_keys(&raw);
            for w in &warnings {
                println!("warning: {w}");
            }
            let config = EngineConfig::from_toml_str(&raw)
                .with_context(|| format!("Invalid config {}", path.display()))?;
            println!(
                "{} is valid ({} warning{})",
                path.display(),
                warnings.len(),
                if warnings.len() == 1 { "" } else { "s" }
            );
            config
        }
        None => {
            println!("No config file found, built-in defaults apply");
            EngineConfig::default()
        }
    };

    println!();
    print!("{}", config.to_toml().context("Failed to render config")?);
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.log_json);

    match args.command {
        SubCommand::Rank {
            samples,
            as_of,
            entities,
            horizon,
            top_k,
            window,
            output,
            narrate_endpoint,
        } => {
            let config = resolve_config(args.config.as_deref())?;
            run_rank(
                config,
                &samples,
                as_of,
                entities,
                horizon,
                top_k,
                window,
                output.as_deref(),
                narrate_endpoint,
            )
            .await
        }
        SubCommand::Forecast {
            samples,
            as_of,
            entity,
            metric,
            horizon,
        } => {
            let config = resolve_config(args.config.as_deref())?;
            run_forecast(&config, &samples, as_of, &entity, metric, horizon)
        }
        SubCommand::CheckConfig => run_check_config(args.config.as_deref()),
    }
}
