use anyhow::Context;
use std::str::FromStr;
use std::sync::Arc;
use tracing_subscriber::prelude::*;
use trend_signals::signal_table::render_signal_table;
use trend_signals::storage_utils::{AppConfig, AsyncStorageManager};
use trend_signals::{NaverDailySource, run_analysis_pipeline};

const REPORT_FILE: &str = "analysis_report.txt";

fn init_tracing(level: &str) {
    let level = tracing::Level::from_str(level).unwrap_or(tracing::Level::INFO);
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_filter(
            tracing_subscriber::filter::Targets::new()
                .with_target("reqwest", tracing::Level::WARN)
                .with_target("hyper_util", tracing::Level::WARN)
                .with_default(level),
        );
    tracing_subscriber::registry().with(fmt_layer).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Step 1: Load configuration
    let storage = AsyncStorageManager::new_relative("storage").await?;
    let config: AppConfig = storage.load_or_default("config").await?;
    init_tracing(&config.log_level);

    let catalog_path = storage.resolve(&config.catalog_path);
    tracing::info!(catalog = %catalog_path.display(), "Starting signal analysis");

    // Step 2: Fetch, analyze and aggregate
    let source = Arc::new(NaverDailySource::new(&config.fetch)?);
    let run = run_analysis_pipeline(&catalog_path, source, &config.scheduler_settings())
        .await
        .context("analysis run failed")?;

    // Step 3: Deliver
    println!("{}", run.report);
    if config.display.signal_table && !run.signals.is_empty() {
        println!("{}", render_signal_table(&run.signals));
    }

    let saved = storage.save_text(REPORT_FILE, &run.report).await?;
    tracing::info!(
        path = %saved.display(),
        processed = run.stats.processed,
        skipped = run.stats.skipped,
        "Report saved"
    );

    Ok(())
}
