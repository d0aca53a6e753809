//! Trend-reversal labels derived from an instrument's indicator rows.
//!
//! Three categories are crossovers confirmed over three bars: the lines sit
//! on one side at `i` after sitting on the other side (or touching) at both
//! `i-1` and `i-2`. Disparity is a one-bar threshold crossing.

use crate::catalog::Instrument;
use crate::indicators::IndicatorRow;
use chrono::NaiveDate;
use std::fmt;

/// Only the most recent rows of a series are labelled.
pub const SIGNAL_WINDOW: usize = 3;
pub const DISPARITY_UP_LEVEL: f64 = 98.0;
pub const DISPARITY_DOWN_LEVEL: f64 = 102.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
}

/// Declaration order is report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    ShortTermCross,
    MidTermCross,
    ConversionCross,
    Disparity,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::ShortTermCross,
        Category::MidTermCross,
        Category::ConversionCross,
        Category::Disparity,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::ShortTermCross => "ShortTermCross",
            Category::MidTermCross => "MidTermCross",
            Category::ConversionCross => "ConversionCross",
            Category::Disparity => "Disparity",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Labels {
    pub short_term_cross: Option<Direction>,
    pub mid_term_cross: Option<Direction>,
    pub conversion_cross: Option<Direction>,
    pub disparity: Option<Direction>,
}

impl Labels {
    pub fn get(&self, category: Category) -> Option<Direction> {
        match category {
            Category::ShortTermCross => self.short_term_cross,
            Category::MidTermCross => self.mid_term_cross,
            Category::ConversionCross => self.conversion_cross,
            Category::Disparity => self.disparity,
        }
    }

    pub fn is_empty(&self) -> bool {
        Category::ALL.iter().all(|c| self.get(*c).is_none())
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, Direction)> + '_ {
        Category::ALL
            .into_iter()
            .filter_map(|c| self.get(c).map(|d| (c, d)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalRow {
    pub date: NaiveDate,
    pub instrument_id: String,
    pub instrument_name: String,
    pub labels: Labels,
}

/// Labels the last [`SIGNAL_WINDOW`] rows and keeps those with at least one
/// event. `rows` must already be in date order.
pub fn detect_signals(instrument: &Instrument, rows: &[IndicatorRow]) -> Vec<SignalRow> {
    let start = rows.len().saturating_sub(SIGNAL_WINDOW);

    (start..rows.len())
        .filter_map(|i| {
            let labels = label_row(rows, i);
            (!labels.is_empty()).then(|| SignalRow {
                date: rows[i].bar.date,
                instrument_id: instrument.id.clone(),
                instrument_name: instrument.display_name.clone(),
                labels,
            })
        })
        .collect()
}

/// Evaluates all four categories at row `i` from rows `i-2..=i`.
pub fn label_row(rows: &[IndicatorRow], i: usize) -> Labels {
    let window = |value: fn(&IndicatorRow) -> Option<f64>| -> [Option<f64>; 3] {
        let at = |back: usize| i.checked_sub(back).and_then(|j| rows.get(j)).and_then(value);
        [at(2), at(1), at(0)]
    };

    let ma5 = window(|r| r.ma5);
    let ma20 = window(|r| r.ma20);
    let ma60 = window(|r| r.ma60);
    let baseline = window(|r| Some(r.baseline));
    let conversion = window(|r| Some(r.conversion_line));
    let disparity = window(|r| r.disparity);

    Labels {
        short_term_cross: confirmed_cross(ma5, ma20),
        mid_term_cross: confirmed_cross(ma20, ma60),
        // Baseline rising above the conversion line reads as Down.
        conversion_cross: confirmed_cross(conversion, baseline),
        disparity: disparity_cross(disparity[1], disparity[2]),
    }
}

/// Down when `fast` drops below `slow` after two bars at or above it; Up is
/// the mirror. Windows are `[i-2, i-1, i]`.
fn confirmed_cross(fast: [Option<f64>; 3], slow: [Option<f64>; 3]) -> Option<Direction> {
    let [(f2, s2), (f1, s1), (f0, s0)] = [(fast[0], slow[0]), (fast[1], slow[1]), (fast[2], slow[2])];

    let down = lt(f0, s0) && ge(f1, s1) && ge(f2, s2);
    let up = gt(f0, s0) && le(f1, s1) && le(f2, s2);

    let mut label = None;
    if down {
        label = Some(Direction::Down);
    }
    if up {
        label = Some(Direction::Up);
    }
    label
}

/// Down is applied after Up, so it wins if both ever fire.
fn disparity_cross(prev: Option<f64>, curr: Option<f64>) -> Option<Direction> {
    let (up_level, down_level) = (Some(DISPARITY_UP_LEVEL), Some(DISPARITY_DOWN_LEVEL));
    let up = gt(curr, up_level) && le(prev, up_level);
    let down = lt(curr, down_level) && ge(prev, down_level);

    let mut label = None;
    if up {
        label = Some(Direction::Up);
    }
    if down {
        label = Some(Direction::Down);
    }
    label
}

// Any comparison with an undefined side is false.

fn lt(a: Option<f64>, b: Option<f64>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a < b)
}

fn le(a: Option<f64>, b: Option<f64>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a <= b)
}

fn gt(a: Option<f64>, b: Option<f64>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a > b)
}

fn ge(a: Option<f64>, b: Option<f64>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a >= b)
}
