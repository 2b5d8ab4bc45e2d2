//! Pipeline Runtime - batch analysis over the configured years and partitions
//!
//! Usage:
//!   cargo run --release --bin pipeline_runtime -- [--backend jsonl|sqlite]
//!
//! Environment variables (see `PipelineConfig::from_env`):
//!   SOCIALFLOW_EVENTS_DB - interaction event database (default: data/events.db)
//!   SOCIALFLOW_PRICES_DB - close price database (default: data/prices.db)
//!   SOCIALFLOW_OUTPUT_PATH - result directory or database file
//!   RUST_LOG - log filter (default: info)

use dotenv::dotenv;
use env_logger::{Builder, Env, Target};
use log::{error, info, warn};
use socialflow::ingest::{SqliteEventReader, SqlitePriceReader};
use socialflow::output::ResultWriter;
use socialflow::pipeline::{AnalysisEngine, PipelineConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Stderr)
        .init();

    info!("🚀 socialflow pipeline runtime");

    let backend = PipelineConfig::parse_backend_from_args();
    let config = PipelineConfig::from_env(backend)?;

    info!("   ├─ Events: {}", config.events_db.display());
    info!("   ├─ Prices: {}", config.prices_db.display());
    info!("   ├─ Output: {} ({})", config.output_path.display(), backend.as_str());
    info!("   ├─ Years: {:?}", config.years);
    info!(
        "   └─ Partitions: {:?}",
        config.partitions.iter().map(|p| p.as_str()).collect::<Vec<_>>()
    );

    let events = SqliteEventReader::new(&config.events_db)?;
    let prices = SqlitePriceReader::new(&config.prices_db)?;
    let mut writer = ResultWriter::new(config.backend, config.output_path.clone())?;

    let engine = AnalysisEngine::from_config(&config, events, prices)?;
    let report = engine.run(&mut writer).await;

    for unit in &report.units {
        let [ok, not_stationary, insufficient, failed] = unit.causality_status_counts;
        info!(
            "📊 {}: {} graphs ({} non-empty), {} merged points, causality ok={} not_stationary={} insufficient={} failed={}",
            unit.key,
            unit.graphs,
            unit.non_empty_graphs,
            unit.merged_points,
            ok,
            not_stationary,
            insufficient,
            failed
        );
        if unit.missing_distances > 0 {
            warn!("⚠️  {}: {} missing distances", unit.key, unit.missing_distances);
        }
    }

    if !report.is_success() {
        for failure in &report.failures {
            error!("❌ {}: {}", failure.key, failure.error);
        }
        let total = report.failures.len() + report.units.len();
        return Err(format!("{} of {} units failed", report.failures.len(), total).into());
    }

    info!("✅ All {} units completed", report.units.len());
    Ok(())
}
