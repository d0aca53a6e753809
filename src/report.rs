//! Folds every instrument's signal rows into category and date tallies and
//! renders the plain-text report handed to the front end.

use crate::scheduler::RunStats;
use crate::signals::{Category, Direction, SignalRow};
use chrono::{DateTime, Local, NaiveDate};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub up: usize,
    pub down: usize,
}

impl Tally {
    fn record(&mut self, direction: Direction) {
        match direction {
            Direction::Up => self.up += 1,
            Direction::Down => self.down += 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstrumentTally {
    pub instrument_id: String,
    pub counts: Tally,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateBucket {
    pub counts: Tally,
    /// Keyed by display name.
    pub instruments: BTreeMap<String, InstrumentTally>,
}

impl DateBucket {
    /// Most up-signals first; equal counts stay in name order.
    pub fn ranked(&self) -> Vec<(&str, &InstrumentTally)> {
        let mut ranked: Vec<(&str, &InstrumentTally)> = self
            .instruments
            .iter()
            .map(|(name, tally)| (name.as_str(), tally))
            .collect();
        ranked.sort_by(|a, b| b.1.counts.up.cmp(&a.1.counts.up));
        ranked
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tallies {
    /// Always holds all four categories.
    pub categories: BTreeMap<Category, Tally>,
    pub dates: BTreeMap<NaiveDate, DateBucket>,
}

impl Default for Tallies {
    fn default() -> Self {
        Self {
            categories: Category::ALL.into_iter().map(|c| (c, Tally::default())).collect(),
            dates: BTreeMap::new(),
        }
    }
}

/// Each Up/Down label counts once for its category, once for the row's date
/// and once for the instrument on that date.
pub fn fold_signals(rows: &[SignalRow]) -> Tallies {
    let mut tallies = Tallies::default();

    for row in rows {
        for (category, direction) in row.labels.iter() {
            tallies.categories.entry(category).or_default().record(direction);

            let bucket = tallies.dates.entry(row.date).or_default();
            bucket.counts.record(direction);

            let instrument = bucket
                .instruments
                .entry(row.instrument_name.clone())
                .or_default();
            instrument.instrument_id = row.instrument_id.clone();
            instrument.counts.record(direction);
        }
    }

    tallies
}

/// Wall-clock start of a run.
#[derive(Debug, Clone, Copy)]
pub struct RunClock {
    pub started_at: DateTime<Local>,
    started: Instant,
}

impl RunClock {
    pub fn start() -> Self {
        Self {
            started_at: Local::now(),
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

pub fn build_report(rows: &[SignalRow], stats: &RunStats, clock: &RunClock) -> String {
    let tallies = fold_signals(rows);
    render_report(&tallies, stats, &clock.started_at, clock.elapsed())
}

pub fn render_report(
    tallies: &Tallies,
    stats: &RunStats,
    started_at: &DateTime<Local>,
    elapsed: Duration,
) -> String {
    let mut report = format!(
        "Analysis time: {} (Execution time: {:.2} seconds)\n",
        started_at.format("%Y-%m-%d %H:%M:%S"),
        elapsed.as_secs_f64()
    );
    report.push_str(&format!(
        "Instruments processed: {}, skipped: {}\n\n",
        stats.processed, stats.skipped
    ));

    report.push_str("Up/Down counts by signal:\n");
    for (category, counts) in &tallies.categories {
        report.push_str(&format!("{}: Up: {}, Down: {}\n", category, counts.up, counts.down));
    }

    report.push_str("\nUp/Down signals by instrument over the last 3 sessions\n");
    for (date, bucket) in tallies.dates.iter().rev() {
        report.push_str(&format!(
            "Date: {} - Up: {}, Down: {}\n",
            date.format("%Y-%m-%d"),
            bucket.counts.up,
            bucket.counts.down
        ));
        for (name, tally) in bucket.ranked() {
            report.push_str(&format!(
                " - {} ({}) - Up: {}, Down: {}\n",
                name, tally.instrument_id, tally.counts.up, tally.counts.down
            ));
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::Labels;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, day).unwrap()
    }

    fn row(day: u32, id: &str, name: &str, labels: Labels) -> SignalRow {
        SignalRow {
            date: date(day),
            instrument_id: id.to_string(),
            instrument_name: name.to_string(),
            labels,
        }
    }

    fn sample_rows() -> Vec<SignalRow> {
        vec![
            row(
                27,
                "005930",
                "Samsung",
                Labels {
                    short_term_cross: Some(Direction::Up),
                    disparity: Some(Direction::Up),
                    ..Labels::default()
                },
            ),
            row(
                30,
                "000660",
                "SK hynix",
                Labels {
                    mid_term_cross: Some(Direction::Down),
                    ..Labels::default()
                },
            ),
            row(
                30,
                "035420",
                "NAVER",
                Labels {
                    conversion_cross: Some(Direction::Up),
                    ..Labels::default()
                },
            ),
            row(
                30,
                "005930",
                "Samsung",
                Labels {
                    conversion_cross: Some(Direction::Down),
                    ..Labels::default()
                },
            ),
        ]
    }

    fn fixed_start() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 1, 2, 9, 30, 0).unwrap()
    }

    #[test]
    fn folds_every_label_into_category_and_date_counts() {
        let tallies = fold_signals(&sample_rows());

        assert_eq!(tallies.categories[&Category::ShortTermCross], Tally { up: 1, down: 0 });
        assert_eq!(tallies.categories[&Category::MidTermCross], Tally { up: 0, down: 1 });
        assert_eq!(tallies.categories[&Category::ConversionCross], Tally { up: 1, down: 1 });
        assert_eq!(tallies.categories[&Category::Disparity], Tally { up: 1, down: 0 });

        let older = &tallies.dates[&date(27)];
        assert_eq!(older.counts, Tally { up: 2, down: 0 });
        assert_eq!(older.instruments["Samsung"].counts, Tally { up: 2, down: 0 });
        assert_eq!(older.instruments["Samsung"].instrument_id, "005930");

        let newer = &tallies.dates[&date(30)];
        assert_eq!(newer.counts, Tally { up: 1, down: 2 });
        assert_eq!(newer.instruments.len(), 3);
    }

    #[test]
    fn empty_input_still_lists_every_category() {
        let tallies = fold_signals(&[]);
        assert_eq!(tallies.categories.len(), 4);
        assert!(tallies.dates.is_empty());

        let report = render_report(&tallies, &RunStats::default(), &fixed_start(), Duration::ZERO);
        assert!(report.contains("ShortTermCross: Up: 0, Down: 0\n"));
        assert!(report.contains("Disparity: Up: 0, Down: 0\n"));
        assert!(!report.contains("Date:"));
    }

    #[test]
    fn renders_dates_newest_first_and_instruments_by_up_count() {
        let stats = RunStats {
            submitted: 4,
            processed: 3,
            skipped: 1,
        };
        let report = render_report(
            &fold_signals(&sample_rows()),
            &stats,
            &fixed_start(),
            Duration::from_millis(12_340),
        );

        let expected = "\
Analysis time: 2025-01-02 09:30:00 (Execution time: 12.34 seconds)
Instruments processed: 3, skipped: 1

Up/Down counts by signal:
ShortTermCross: Up: 1, Down: 0
MidTermCross: Up: 0, Down: 1
ConversionCross: Up: 1, Down: 1
Disparity: Up: 1, Down: 0

Up/Down signals by instrument over the last 3 sessions
Date: 2024-12-30 - Up: 1, Down: 2
 - NAVER (035420) - Up: 1, Down: 0
 - SK hynix (000660) - Up: 0, Down: 1
 - Samsung (005930) - Up: 0, Down: 1
Date: 2024-12-27 - Up: 2, Down: 0
 - Samsung (005930) - Up: 2, Down: 0
";
        assert_eq!(report, expected);
    }

    proptest! {
        #[test]
        fn fold_is_independent_of_row_order(shuffled in Just(sample_rows()).prop_shuffle()) {
            prop_assert_eq!(fold_signals(&shuffled), fold_signals(&sample_rows()));

            let start = fixed_start();
            let stats = RunStats::default();
            prop_assert_eq!(
                render_report(&fold_signals(&shuffled), &stats, &start, Duration::ZERO),
                render_report(&fold_signals(&sample_rows()), &stats, &start, Duration::ZERO)
            );
        }
    }
}
