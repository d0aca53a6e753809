//! This module contains the core analysis pipeline logic.

use crate::catalog::{Instrument, load_catalog};
use crate::daily_bars::BarSource;
use crate::error::Result;
use crate::report::{RunClock, build_report};
use crate::scheduler::{RunStats, SchedulerSettings, run_all};
use crate::signals::SignalRow;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug)]
pub struct AnalysisRun {
    pub report: String,
    pub signals: Vec<SignalRow>,
    pub stats: RunStats,
}

/// Runs the full analysis pipeline:
/// 1. Loads the instrument catalog.
/// 2. Fetches, computes and detects signals for every instrument in parallel.
/// 3. Folds all signals into the text report.
///
/// Only an unreadable catalog fails the run.
pub async fn run_analysis_pipeline<S>(
    catalog_path: &Path,
    source: Arc<S>,
    settings: &SchedulerSettings,
) -> Result<AnalysisRun>
where
    S: BarSource + 'static,
{
    let clock = RunClock::start();
    let catalog = load_catalog(catalog_path)?;
    Ok(analyze_catalog(&catalog, source, settings, &clock).await)
}

/// Steps 2 and 3 of [`run_analysis_pipeline`] for an already loaded catalog.
pub async fn analyze_catalog<S>(
    catalog: &[Instrument],
    source: Arc<S>,
    settings: &SchedulerSettings,
    clock: &RunClock,
) -> AnalysisRun
where
    S: BarSource + 'static,
{
    let outcome = run_all(catalog, source, settings).await;
    let report = build_report(&outcome.signals, &outcome.stats, clock);

    AnalysisRun {
        report,
        signals: outcome.signals,
        stats: outcome.stats,
    }
}
