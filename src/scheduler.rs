use crate::catalog::Instrument;
use crate::daily_bars::{BarSource, fetch_series};
use crate::error::{Error, Result};
use crate::indicators::{IndicatorSettings, compute_indicators};
use crate::signals::{SignalRow, detect_signals};
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tokio::sync::Semaphore;

#[derive(Debug, Clone, Copy)]
pub struct SchedulerSettings {
    pub workers: usize,
    pub pages: u32,
    pub indicators: IndicatorSettings,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            workers: 8,
            pages: 7,
            indicators: IndicatorSettings::default(),
        }
    }
}

/// How many instruments made it through the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub submitted: usize,
    pub processed: usize,
    pub skipped: usize,
}

#[derive(Debug, Default)]
pub struct ScheduleOutcome {
    /// In completion order, which varies between runs.
    pub signals: Vec<SignalRow>,
    pub stats: RunStats,
}

/// Fetch, compute and detect for a single instrument.
pub async fn process_instrument<S: BarSource>(
    source: &S,
    instrument: &Instrument,
    pages: u32,
    indicators: &IndicatorSettings,
) -> Result<Vec<SignalRow>> {
    let bars = fetch_series(source, instrument, pages).await?;
    let rows = compute_indicators(bars, indicators)?;
    Ok(detect_signals(instrument, &rows))
}

/// Runs every instrument through [`process_instrument`] with at most
/// `settings.workers` pipelines in flight.
///
/// All instruments are submitted up front. A failing or panicking instrument
/// is logged and counted as skipped; it never cancels the others.
pub async fn run_all<S>(catalog: &[Instrument], source: Arc<S>, settings: &SchedulerSettings) -> ScheduleOutcome
where
    S: BarSource + 'static,
{
    let permits = Arc::new(Semaphore::new(settings.workers.max(1)));
    let pages = settings.pages;
    let indicators = settings.indicators;

    let mut pending: FuturesUnordered<_> = catalog
        .iter()
        .cloned()
        .map(|instrument| {
            let source = Arc::clone(&source);
            let permits = Arc::clone(&permits);
            let instrument_id = instrument.id.clone();

            let handle = tokio::spawn(async move {
                let _permit = permits.acquire_owned().await.map_err(|e| Error::WorkerAborted {
                    instrument_id: instrument.id.clone(),
                    cause: e.to_string(),
                })?;
                process_instrument(source.as_ref(), &instrument, pages, &indicators).await
            });

            async move {
                let outcome = handle.await.unwrap_or_else(|e| {
                    Err(Error::WorkerAborted {
                        instrument_id: instrument_id.clone(),
                        cause: e.to_string(),
                    })
                });
                (instrument_id, outcome)
            }
        })
        .collect();

    let mut outcome = ScheduleOutcome {
        stats: RunStats {
            submitted: catalog.len(),
            ..RunStats::default()
        },
        ..ScheduleOutcome::default()
    };

    while let Some((instrument_id, result)) = pending.next().await {
        match result {
            Ok(rows) => {
                tracing::debug!(instrument = %instrument_id, signals = rows.len(), "Instrument processed");
                outcome.stats.processed += 1;
                outcome.signals.extend(rows);
            }
            Err(e) => {
                tracing::warn!(instrument = %instrument_id, error = %e, "Instrument skipped");
                outcome.stats.skipped += 1;
            }
        }
    }

    tracing::info!(
        submitted = outcome.stats.submitted,
        processed = outcome.stats.processed,
        skipped = outcome.stats.skipped,
        signals = outcome.signals.len(),
        "All instruments collected"
    );
    outcome
}
