//! Layered timestamp parsing for the resolved date column.
//!
//! Strategies are tried in a fixed order and the first one that parses at
//! least one value is used for the whole column:
//!
//! 1. automatic, month before day
//! 2. automatic, day before month
//! 3. explicit formats, each applied to the whole column
//! 4. per-row best effort, day before month
//!
//! The automatic strategies infer a single layout from the first value that
//! matches one of their candidate layouts and apply it to every row. Leading
//! sentinels such as `n/a` are skipped during inference and become missing.
//! The month-first strategy only knows ISO, month-first and compact layouts;
//! the day-first strategy swaps month-first for day-first layouts, so it runs
//! on columns like `25/12/2023` that the first strategy cannot read.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info};

use crate::error::{ProcessingError, Result};
use crate::models::RawTable;

/// Formats tried by the explicit-format strategy, in order
pub const EXPLICIT_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M",
    "%m/%d/%Y",
    "%d/%m/%Y",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOrder {
    MonthFirst,
    DayFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStrategy {
    Automatic,
    AutomaticDayFirst,
    ExplicitFormat(&'static str),
    PerRowDayFirst,
}

impl fmt::Display for ParseStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseStrategy::Automatic => write!(f, "automatic"),
            ParseStrategy::AutomaticDayFirst => write!(f, "automatic (day first)"),
            ParseStrategy::ExplicitFormat(fmt) => write!(f, "format '{}'", fmt),
            ParseStrategy::PerRowDayFirst => write!(f, "per-row best effort (day first)"),
        }
    }
}

/// Result of parsing one column with the layered strategy
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnParse {
    pub strategy: ParseStrategy,
    pub values: Vec<Option<NaiveDateTime>>,
}

impl ColumnParse {
    pub fn parsed_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateParseReport {
    pub column: String,
    pub strategy: ParseStrategy,
    pub total_rows: usize,
    pub parsed_rows: usize,
    pub dropped_rows: usize,
}

/// Rows that survived date parsing, sorted by timestamp
#[derive(Debug, Clone)]
pub struct TimestampedRows {
    pub timestamps: Vec<NaiveDateTime>,
    pub table: RawTable,
    pub report: DateParseReport,
}

#[derive(Debug, Clone, Copy)]
enum Layout {
    DateTime(&'static str),
    Date(&'static str),
    Rfc3339,
}

const ISO_LAYOUTS: [Layout; 8] = [
    Layout::Rfc3339,
    Layout::DateTime("%Y-%m-%dT%H:%M:%S%.f"),
    Layout::DateTime("%Y-%m-%d %H:%M:%S%.f"),
    Layout::DateTime("%Y-%m-%dT%H:%M"),
    Layout::DateTime("%Y-%m-%d %H:%M"),
    Layout::Date("%Y-%m-%d"),
    Layout::DateTime("%Y/%m/%d %H:%M:%S"),
    Layout::Date("%Y/%m/%d"),
];

const MONTH_FIRST_LAYOUTS: [Layout; 7] = [
    Layout::DateTime("%m/%d/%Y %H:%M:%S"),
    Layout::DateTime("%m/%d/%Y %H:%M"),
    Layout::Date("%m/%d/%Y"),
    Layout::Date("%m-%d-%Y"),
    Layout::Date("%m/%d/%y"),
    Layout::Date("%b %d %Y"),
    Layout::Date("%b %d, %Y"),
];

const DAY_FIRST_LAYOUTS: [Layout; 8] = [
    Layout::DateTime("%d/%m/%Y %H:%M:%S"),
    Layout::DateTime("%d/%m/%Y %H:%M"),
    Layout::Date("%d/%m/%Y"),
    Layout::Date("%d-%m-%Y"),
    Layout::Date("%d.%m.%Y"),
    Layout::Date("%d/%m/%y"),
    Layout::Date("%d %b %Y"),
    Layout::Date("%d-%b-%Y"),
];

const COMPACT_LAYOUTS: [Layout; 2] = [Layout::DateTime("%Y%m%d%H%M"), Layout::Date("%Y%m%d")];

impl Layout {
    fn parse(&self, value: &str) -> Option<NaiveDateTime> {
        let parsed = match self {
            Layout::DateTime(fmt) => NaiveDateTime::parse_from_str(value, fmt).ok(),
            Layout::Date(fmt) => NaiveDate::parse_from_str(value, fmt)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0)),
            Layout::Rfc3339 => DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.naive_local()),
        }?;
        within_year_range(parsed)
    }
}

/// Reject four-digit year formats that read a two-digit year as year 24 and the like
fn within_year_range(parsed: NaiveDateTime) -> Option<NaiveDateTime> {
    (1000..=9999).contains(&parsed.year()).then_some(parsed)
}

/// Candidate layouts of one automatic strategy
fn automatic_layouts(order: DateOrder) -> Vec<Layout> {
    let ordered = match order {
        DateOrder::MonthFirst => &MONTH_FIRST_LAYOUTS[..],
        DateOrder::DayFirst => &DAY_FIRST_LAYOUTS[..],
    };
    ISO_LAYOUTS
        .iter()
        .chain(ordered)
        .chain(COMPACT_LAYOUTS.iter())
        .copied()
        .collect()
}

/// Every known layout, day-first before month-first
fn best_effort_layouts() -> Vec<Layout> {
    ISO_LAYOUTS
        .iter()
        .chain(DAY_FIRST_LAYOUTS.iter())
        .chain(MONTH_FIRST_LAYOUTS.iter())
        .chain(COMPACT_LAYOUTS.iter())
        .copied()
        .collect()
}

/// Automatic parse: infer one layout from the first value any candidate layout
/// reads, then apply that layout to all rows
pub fn parse_automatic(values: &[&str], order: DateOrder) -> Vec<Option<NaiveDateTime>> {
    let candidates = automatic_layouts(order);
    let inferred = values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .find_map(|v| candidates.iter().find(|l| l.parse(v).is_some()));

    match inferred {
        Some(layout) => values.iter().map(|v| layout.parse(v.trim())).collect(),
        None => vec![None; values.len()],
    }
}

/// Parse every value with one exact format
pub fn parse_with_format(values: &[&str], format: &str) -> Vec<Option<NaiveDateTime>> {
    let has_time = format.contains("%H");
    values
        .iter()
        .map(|v| {
            let v = v.trim();
            let parsed = if has_time {
                NaiveDateTime::parse_from_str(v, format).ok()
            } else {
                NaiveDate::parse_from_str(v, format)
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            }?;
            within_year_range(parsed)
        })
        .collect()
}

/// First explicit format that parses at least one value
pub fn parse_explicit_formats(values: &[&str]) -> Option<(&'static str, Vec<Option<NaiveDateTime>>)> {
    EXPLICIT_FORMATS.iter().find_map(|format| {
        let parsed = parse_with_format(values, format);
        parsed.iter().any(Option::is_some).then_some((*format, parsed))
    })
}

/// Best-effort parse of a single value, day before month
pub fn parse_best_effort(value: &str) -> Option<NaiveDateTime> {
    let cleaned = value
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if cleaned.is_empty() {
        return None;
    }

    let candidates = best_effort_layouts();
    let try_all = |s: &str| candidates.iter().find_map(|l| l.parse(s));

    try_all(&cleaned).or_else(|| {
        // Unify separators: 2024.01.05 / 05-01-2024 / 05.01.2024 14:00
        let (date_part, time_part) = match cleaned.split_once(' ') {
            Some((d, t)) => (d.to_string(), Some(t)),
            None => (cleaned.clone(), None),
        };
        let date_part = date_part.replace(['.', '-'], "/");
        let unified = match time_part {
            Some(t) => format!("{} {}", date_part, t),
            None => date_part,
        };
        try_all(&unified)
    })
}

/// Run the strategies in order and keep the first with any success
pub fn parse_layered(values: &[&str]) -> ColumnParse {
    let automatic = [
        (ParseStrategy::Automatic, DateOrder::MonthFirst),
        (ParseStrategy::AutomaticDayFirst, DateOrder::DayFirst),
    ];
    for (strategy, order) in automatic {
        let parsed = parse_automatic(values, order);
        if parsed.iter().any(Option::is_some) {
            return ColumnParse {
                strategy,
                values: parsed,
            };
        }
        debug!("Date strategy '{}' parsed nothing", strategy);
    }

    if let Some((format, parsed)) = parse_explicit_formats(values) {
        return ColumnParse {
            strategy: ParseStrategy::ExplicitFormat(format),
            values: parsed,
        };
    }
    debug!("No explicit date format matched");

    ColumnParse {
        strategy: ParseStrategy::PerRowDayFirst,
        values: values.iter().map(|v| parse_best_effort(v)).collect(),
    }
}

/// Converts the date column into timestamps, drops unparseable rows and sorts
pub struct TemporalParser;

impl TemporalParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse the column at `date_index` and reorder the table by its timestamps
    pub fn parse(&self, mut table: RawTable, date_index: usize) -> Result<TimestampedRows> {
        let column = table.column(date_index).ok_or_else(|| {
            ProcessingError::MissingData(format!("date column {} not found", date_index))
        })?;
        let date_column = table.headers[date_index].clone();

        let total_rows = column.len();
        let parse = parse_layered(&column);
        let parsed_rows = parse.parsed_count();
        info!(
            "Parsed dates: {}/{} valid (strategy: {})",
            parsed_rows, total_rows, parse.strategy
        );

        let keep: Vec<bool> = parse.values.iter().map(Option::is_some).collect();
        table.retain_rows(&keep);
        let timestamps: Vec<NaiveDateTime> = parse.values.into_iter().flatten().collect();

        let dropped_rows = total_rows - parsed_rows;
        info!("Dropped {} rows with invalid dates.", dropped_rows);

        // Stable sort keeps the input order of duplicate timestamps
        let mut order: Vec<usize> = (0..timestamps.len()).collect();
        order.sort_by_key(|&i| timestamps[i]);
        let sorted_timestamps = order.iter().map(|&i| timestamps[i]).collect();
        let mut rows: Vec<Option<Vec<String>>> = table.rows.drain(..).map(Some).collect();
        table.rows = order.iter().filter_map(|&i| rows[i].take()).collect();

        Ok(TimestampedRows {
            timestamps: sorted_timestamps,
            table,
            report: DateParseReport {
                column: date_column,
                strategy: parse.strategy,
                total_rows,
                parsed_rows,
                dropped_rows,
            },
        })
    }
}

impl Default for TemporalParser {
    fn default() -> Self {
        Self::new()
    }
}
