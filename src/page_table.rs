//! Extracts daily rows from one provider page.
//!
//! Only the first `<table>` of the page is read. Columns are located by their
//! header text, so column order does not matter.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

static TABLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<table\b[^>]*>(.*?)</table>").expect("table regex"));
static ROW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<tr\b[^>]*>(.*?)</tr>").expect("row regex"));
static CELL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<t([hd])\b[^>]*>(.*?)</t[hd]>").expect("cell regex"));
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("tag regex"));

const DATE_FORMATS: &[&str] = &["%Y.%m.%d", "%Y-%m-%d", "%Y/%m/%d"];

/// One table row as read from the page. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    pub date: Option<NaiveDate>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Date,
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl Column {
    fn from_header(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "날짜" | "date" => Some(Column::Date),
            "시가" | "open" => Some(Column::Open),
            "고가" | "high" => Some(Column::High),
            "저가" | "low" => Some(Column::Low),
            "종가" | "close" => Some(Column::Close),
            "거래량" | "volume" => Some(Column::Volume),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct Layout {
    date: Option<usize>,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    close: Option<usize>,
    volume: Option<usize>,
}

impl Layout {
    fn from_headers(headers: &[String]) -> Self {
        let mut layout = Layout::default();
        for (idx, header) in headers.iter().enumerate() {
            let slot = match Column::from_header(header) {
                Some(Column::Date) => &mut layout.date,
                Some(Column::Open) => &mut layout.open,
                Some(Column::High) => &mut layout.high,
                Some(Column::Low) => &mut layout.low,
                Some(Column::Close) => &mut layout.close,
                Some(Column::Volume) => &mut layout.volume,
                None => continue,
            };
            if slot.is_none() {
                *slot = Some(idx);
            }
        }
        layout
    }

    fn is_usable(&self) -> bool {
        self.date.is_some() && self.high.is_some() && self.low.is_some() && self.close.is_some()
    }

    fn read(&self, cells: &[String]) -> RawRow {
        let text = |idx: Option<usize>| idx.and_then(|i| cells.get(i)).map(String::as_str);
        let close = text(self.close).and_then(parse_price);

        RawRow {
            date: text(self.date).and_then(parse_date),
            // Missing columns (not cells) fall back to neutral values.
            open: match self.open {
                Some(_) => text(self.open).and_then(parse_price),
                None => close,
            },
            high: text(self.high).and_then(parse_price),
            low: text(self.low).and_then(parse_price),
            close,
            volume: match self.volume {
                Some(_) => text(self.volume).and_then(parse_volume),
                None => Some(0),
            },
        }
    }
}

/// Returns `None` when the page has no table, or its first table lacks a
/// date/close/high/low header.
pub fn parse_daily_table(html: &str) -> Option<Vec<RawRow>> {
    let table = TABLE_RE.captures(html)?.get(1)?.as_str();

    let mut layout: Option<Layout> = None;
    let mut rows = Vec::new();

    for row in ROW_RE.captures_iter(table) {
        let inner = &row[1];
        let mut is_header = false;
        let cells: Vec<String> = CELL_RE
            .captures_iter(inner)
            .map(|cell| {
                is_header |= cell[1].eq_ignore_ascii_case("h");
                cell_text(&cell[2])
            })
            .collect();

        if is_header {
            if layout.is_none() {
                layout = Some(Layout::from_headers(&cells));
            }
            continue;
        }

        // Spacer rows carry a single empty cell.
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }

        if let Some(layout) = layout.as_ref() {
            rows.push(layout.read(&cells));
        }
    }

    match layout {
        Some(layout) if layout.is_usable() => Some(rows),
        _ => None,
    }
}

fn cell_text(raw: &str) -> String {
    let stripped = TAG_RE.replace_all(raw, "");
    stripped
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

fn parse_price(text: &str) -> Option<f64> {
    let cleaned: String = text.chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_volume(text: &str) -> Option<u64> {
    let cleaned: String = text.chars().filter(|c| *c != ',').collect();
    cleaned.parse::<u64>().ok()
}
