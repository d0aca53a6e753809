//! Daily trend-reversal signals for a fixed equity universe.
//!
//! The pipeline loads the instrument catalog, fetches paginated daily bars
//! for every instrument on a bounded worker pool, derives moving-average and
//! midpoint-line indicators, labels crossovers on the last three sessions and
//! folds everything into one plain-text report.

pub mod analysis;
pub mod catalog;
pub mod daily_bars;
pub mod error;
pub mod indicators;
pub mod page_table;
pub mod report;
pub mod scheduler;
pub mod signal_table;
pub mod signals;
pub mod storage_utils;

pub use analysis::{AnalysisRun, analyze_catalog, run_analysis_pipeline};
pub use catalog::Instrument;
pub use daily_bars::{Bar, BarSource, FetchSettings, NaverDailySource};
pub use error::{Error, Result};
pub use report::RunClock;
pub use scheduler::{RunStats, SchedulerSettings};
pub use signals::{Category, Direction, SignalRow};
