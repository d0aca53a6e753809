use crate::daily_bars::Bar;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use ta::Next;
use ta::errors::TaError;
use ta::indicators::{Maximum, Minimum, SimpleMovingAverage};

pub const SHORT_MA_PERIOD: usize = 5;
pub const MID_MA_PERIOD: usize = 20;
pub const LONG_MA_PERIOD: usize = 60;
pub const BASELINE_PERIOD: usize = 26;
pub const CONVERSION_PERIOD: usize = 9;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default)]
#[serde(default)]
pub struct IndicatorSettings {
    /// Keep only the last-loaded bar per date. Overlapping provider pages
    /// otherwise repeat a day inside the rolling windows.
    pub dedupe_dates: bool,
}

/// A bar with its derived indicator values.
///
/// Moving averages and disparity are `None` until their window is full.
/// Baseline and conversion line read `0.0` instead.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorRow {
    pub bar: Bar,
    pub ma5: Option<f64>,
    pub ma20: Option<f64>,
    pub ma60: Option<f64>,
    pub baseline: f64,
    pub conversion_line: f64,
    pub disparity: Option<f64>,
}

struct RollingMean {
    sma: SimpleMovingAverage,
    period: usize,
}

impl RollingMean {
    fn new(period: usize) -> Result<Self> {
        let sma = SimpleMovingAverage::new(period).map_err(|e: TaError| Error::Indicator(format!("{:?}", e)))?;
        Ok(Self { sma, period })
    }

    fn next(&mut self, index: usize, close: f64) -> Option<f64> {
        let mean = self.sma.next(close);
        (index + 1 >= self.period).then_some(mean)
    }
}

/// Midpoint of the highest high and lowest low over a trailing window,
/// rounded half to even.
struct MidpointLine {
    highest: Maximum,
    lowest: Minimum,
    period: usize,
}

impl MidpointLine {
    fn new(period: usize) -> Result<Self> {
        let to_err = |e: TaError| Error::Indicator(format!("{:?}", e));
        Ok(Self {
            highest: Maximum::new(period).map_err(to_err)?,
            lowest: Minimum::new(period).map_err(to_err)?,
            period,
        })
    }

    fn next(&mut self, index: usize, high: f64, low: f64) -> f64 {
        let highest = self.highest.next(high);
        let lowest = self.lowest.next(low);
        if index + 1 >= self.period {
            ((highest + lowest) / 2.0).round_ties_even()
        } else {
            0.0
        }
    }
}

/// Sorts `bars` by date (stable) and computes every indicator over the result.
pub fn compute_indicators(mut bars: Vec<Bar>, settings: &IndicatorSettings) -> Result<Vec<IndicatorRow>> {
    bars.sort_by_key(|bar| bar.date);
    if settings.dedupe_dates {
        bars = keep_last_per_date(bars);
    }

    let mut ma5 = RollingMean::new(SHORT_MA_PERIOD)?;
    let mut ma20 = RollingMean::new(MID_MA_PERIOD)?;
    let mut ma60 = RollingMean::new(LONG_MA_PERIOD)?;
    let mut baseline = MidpointLine::new(BASELINE_PERIOD)?;
    let mut conversion = MidpointLine::new(CONVERSION_PERIOD)?;

    let rows = bars
        .into_iter()
        .enumerate()
        .map(|(i, bar)| {
            let short = ma5.next(i, bar.close);
            let mid = ma20.next(i, bar.close);
            let disparity = match (short, mid) {
                (Some(s), Some(m)) => Some((s / m) * 100.0),
                _ => None,
            };

            IndicatorRow {
                ma5: short,
                ma20: mid,
                ma60: ma60.next(i, bar.close),
                baseline: baseline.next(i, bar.high, bar.low),
                conversion_line: conversion.next(i, bar.high, bar.low),
                disparity,
                bar,
            }
        })
        .collect();

    Ok(rows)
}

fn keep_last_per_date(bars: Vec<Bar>) -> Vec<Bar> {
    let mut kept: Vec<Bar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match kept.last_mut() {
            Some(last) if last.date == bar.date => *last = bar,
            _ => kept.push(bar),
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(offset)
    }

    fn bar(offset: i64, close: f64) -> Bar {
        Bar {
            date: day(offset),
            open: close,
            high: close,
            low: close,
            close,
            volume: 100,
        }
    }

    fn closes(values: &[f64]) -> Vec<Bar> {
        values.iter().enumerate().map(|(i, c)| bar(i as i64, *c)).collect()
    }

    #[test]
    fn short_history_leaves_moving_averages_undefined() {
        let rows = compute_indicators(closes(&[1.0, 2.0, 3.0, 4.0]), &IndicatorSettings::default()).unwrap();
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| r.ma5.is_none() && r.ma20.is_none() && r.disparity.is_none()));
    }

    #[test]
    fn ma5_is_the_trailing_inclusive_mean() {
        let rows = compute_indicators(closes(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]), &IndicatorSettings::default()).unwrap();
        assert_eq!(rows[3].ma5, None);
        assert_eq!(rows[4].ma5, Some(3.0));
        assert_eq!(rows[5].ma5, Some(4.0));
        assert_eq!(rows[6].ma5, Some(5.0));
    }

    #[test]
    fn unordered_input_is_sorted_by_date() {
        let mut bars = closes(&[10.0, 20.0, 30.0]);
        bars.reverse();
        let rows = compute_indicators(bars, &IndicatorSettings::default()).unwrap();
        let dates: Vec<NaiveDate> = rows.iter().map(|r| r.bar.date).collect();
        assert_eq!(dates, vec![day(0), day(1), day(2)]);
    }

    #[test]
    fn ma20_and_disparity_after_twenty_bars() {
        let mut values = vec![100.0; 19];
        values.push(120.0);
        let rows = compute_indicators(closes(&values), &IndicatorSettings::default()).unwrap();

        let last = rows.last().unwrap();
        assert_eq!(rows[18].ma20, None);
        assert_eq!(last.ma20, Some(101.0));
        assert_eq!(last.ma5, Some(104.0));
        assert_eq!(last.disparity, Some((104.0 / 101.0) * 100.0));
        assert_eq!(last.ma60, None);
    }

    #[test]
    fn midpoint_lines_default_to_zero_until_window_fills() {
        let rows = compute_indicators(closes(&vec![50.0; 30]), &IndicatorSettings::default()).unwrap();
        assert_eq!(rows[7].conversion_line, 0.0);
        assert_eq!(rows[8].conversion_line, 50.0);
        assert_eq!(rows[24].baseline, 0.0);
        assert_eq!(rows[25].baseline, 50.0);
    }

    #[test]
    fn midpoint_rounds_half_to_even() {
        let mut bars = closes(&vec![10.0; 9]);
        bars[8].high = 11.0;
        let rows = compute_indicators(bars.clone(), &IndicatorSettings::default()).unwrap();
        // (11 + 10) / 2 = 10.5
        assert_eq!(rows[8].conversion_line, 10.0);

        bars[8].high = 13.0;
        let rows = compute_indicators(bars, &IndicatorSettings::default()).unwrap();
        // (13 + 10) / 2 = 11.5
        assert_eq!(rows[8].conversion_line, 12.0);
    }

    #[test]
    fn duplicate_dates_are_kept_unless_deduplicated() {
        let mut bars = closes(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        bars.push(bar(4, 50.0));

        let rows = compute_indicators(bars.clone(), &IndicatorSettings::default()).unwrap();
        assert_eq!(rows.len(), 6);
        // Stable sort keeps page order for equal dates.
        assert_eq!(rows[4].bar.close, 5.0);
        assert_eq!(rows[5].bar.close, 50.0);

        let rows = compute_indicators(bars, &IndicatorSettings { dedupe_dates: true }).unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[4].bar.close, 50.0);
        assert_eq!(rows[4].ma5, Some(12.0));
    }
}
