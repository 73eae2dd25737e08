//! top100 - one-shot holder report
//!
//! Runs the ranking pipeline once (the manual "report" command) and prints
//! the report chunks to stdout, separated by blank lines.
//!
//! Usage:
//!   cargo run --release --bin top100
//!
//! Environment variables:
//!   PRIMARY_SOURCE - file:<path> or http(s) URL, optional {page} placeholder
//!   FALLBACK_SOURCE - same format, tried when the primary fails or is empty
//!   SOURCE_PAGES - pages fetched for {page} URLs (default: 4)
//!   SNAPSHOT_BACKEND - json | sqlite (default: json)
//!   SNAPSHOT_PATH - snapshot location (default: data/last_top100.json)
//!   TOP_N - holders to rank (default: 100)
//!   FLAG_THRESHOLD_PCT - swing that flags a holder (default: 50)
//!   PROVIDER_TIMEOUT_MS - per-provider timeout (default: 30000)
//!   REPORT_MAX_CHARS - max characters per chunk (default: 3800)
//!   ASSET_SYMBOL - unit shown next to balances (default: ETH)

use dotenv::dotenv;
use holderwatch::config::Config;
use holderwatch::pipeline::{Persistence, PipelineConfig, RankingPipeline};
use holderwatch::providers::ProviderChain;
use holderwatch::report::{render_report, ReportOptions};
use holderwatch::store::{open_backend, SnapshotStore};
use log::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            return Err(e.into());
        }
    };

    let mut builder = if config.rust_log.is_some() {
        env_logger::Builder::from_default_env()
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
    };
    builder.target(env_logger::Target::Stderr).init();

    let pipeline_config = PipelineConfig::from_env();

    info!("🚀 Starting top{} report", pipeline_config.top_n);
    info!("📊 Configuration:");
    for (name, spec) in &config.sources {
        info!("   ├─ {} source: {:?}", name, spec);
    }
    info!("   ├─ Snapshot: {:?} at {}", pipeline_config.backend, pipeline_config.snapshot_path);
    info!("   ├─ Flag threshold: {}%", pipeline_config.flag_threshold_pct);
    info!("   └─ Provider timeout: {}ms", pipeline_config.provider_timeout.as_millis());

    info!("🔧 Opening snapshot store...");
    let backend = open_backend(pipeline_config.backend, &pipeline_config.snapshot_path)?;
    let store = SnapshotStore::new(backend);

    let sources = config.build_sources(pipeline_config.provider_timeout)?;
    let providers = ProviderChain::new(sources, pipeline_config.provider_timeout);

    let pipeline = RankingPipeline::new(providers, store)
        .with_top_n(pipeline_config.top_n)
        .with_flag_threshold(pipeline_config.flag_threshold_pct);

    let report = pipeline.produce_report().await;

    match &report.persistence {
        Persistence::Saved => info!("✅ Snapshot saved for next comparison"),
        Persistence::SkippedEmpty => info!("⚠️  Nothing fetched, previous snapshot kept"),
        Persistence::Failed(e) => error!("❌ Snapshot not saved: {}", e),
    }

    let options = ReportOptions {
        max_chars: config.report_max_chars,
        asset_symbol: config.asset_symbol.clone(),
        top_n: pipeline_config.top_n,
        flag_threshold_pct: pipeline_config.flag_threshold_pct,
    };

    let chunks = render_report(&report, &options);
    for (idx, chunk) in chunks.iter().enumerate() {
        if idx > 0 {
            println!();
        }
        println!("{}", chunk);
    }

    Ok(())
}
