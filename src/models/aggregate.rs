use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::Field;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    Mean,
    Min,
    Max,
    Std,
    Sum,
}

impl Statistic {
    pub fn name(&self) -> &'static str {
        match self {
            Statistic::Mean => "mean",
            Statistic::Min => "min",
            Statistic::Max => "max",
            Statistic::Std => "std",
            Statistic::Sum => "sum",
        }
    }
}

/// Meteorological season
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Season {
    #[serde(rename = "DJF")]
    Djf,
    #[serde(rename = "MAM")]
    Mam,
    #[serde(rename = "JJA")]
    Jja,
    #[serde(rename = "SON")]
    Son,
}

impl Season {
    pub fn from_month(month: u32) -> Self {
        match month {
            12 | 1 | 2 => Season::Djf,
            3..=5 => Season::Mam,
            6..=8 => Season::Jja,
            _ => Season::Son,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Season::Djf => "DJF",
            Season::Mam => "MAM",
            Season::Jja => "JJA",
            Season::Son => "SON",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Identity of an aggregation bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BucketKey {
    Day(NaiveDate),
    /// Labelled by the last day of the month
    Month(NaiveDate),
    /// Labelled by the last day of the year
    Year(NaiveDate),
    MonthOfYear(u32),
    Season(Season),
}

impl BucketKey {
    pub fn label(&self) -> String {
        match self {
            BucketKey::Day(d) | BucketKey::Month(d) | BucketKey::Year(d) => {
                d.format("%Y-%m-%d").to_string()
            }
            BucketKey::MonthOfYear(m) => m.to_string(),
            BucketKey::Season(s) => s.label().to_string(),
        }
    }

    /// Calendar date the bucket is labelled with, for time-based buckets
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            BucketKey::Day(d) | BucketKey::Month(d) | BucketKey::Year(d) => Some(*d),
            _ => None,
        }
    }

    /// `YYYY-MM` for monthly buckets, the full label otherwise
    pub fn month_label(&self) -> String {
        match self {
            BucketKey::Month(d) => format!("{:04}-{:02}", d.year(), d.month()),
            other => other.label(),
        }
    }
}

/// The five fixed aggregate views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateKind {
    Daily,
    Monthly,
    Yearly,
    ByMonth,
    BySeason,
}

impl AggregateKind {
    pub const ALL: [AggregateKind; 5] = [
        AggregateKind::Daily,
        AggregateKind::Monthly,
        AggregateKind::Yearly,
        AggregateKind::ByMonth,
        AggregateKind::BySeason,
    ];

    pub fn artifact_stem(&self) -> &'static str {
        match self {
            AggregateKind::Daily => "daily_summary",
            AggregateKind::Monthly => "monthly_summary",
            AggregateKind::Yearly => "yearly_summary",
            AggregateKind::ByMonth => "grouped_by_month",
            AggregateKind::BySeason => "grouped_by_season",
        }
    }

    pub fn key_column(&self) -> &'static str {
        match self {
            AggregateKind::Daily | AggregateKind::Monthly | AggregateKind::Yearly => "period",
            AggregateKind::ByMonth => "month",
            AggregateKind::BySeason => "season",
        }
    }

    pub fn is_grouped(&self) -> bool {
        matches!(self, AggregateKind::ByMonth | AggregateKind::BySeason)
    }

    /// Statistics computed for a field in this view. Grouped views carry a
    /// reduced set for rainfall and humidity.
    pub fn statistics(&self, field: Field) -> &'static [Statistic] {
        use Statistic::*;
        match (self.is_grouped(), field) {
            (_, Field::Temperature) => &[Mean, Min, Max, Std],
            (false, Field::Rainfall) => &[Sum, Mean, Std],
            (false, Field::Humidity) => &[Mean, Min, Max, Std],
            (true, Field::Rainfall) => &[Sum, Mean],
            (true, Field::Humidity) => &[Mean, Min, Max],
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    pub key: BucketKey,
    pub values: Vec<Option<f64>>,
}

/// One aggregate view: a row per bucket, a column per (field, statistic)
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateTable {
    pub kind: AggregateKind,
    pub columns: Vec<(Field, Statistic)>,
    pub rows: Vec<AggregateRow>,
}

impl AggregateTable {
    pub fn new(kind: AggregateKind, columns: Vec<(Field, Statistic)>) -> Self {
        Self {
            kind,
            columns,
            rows: Vec::new(),
        }
    }

    pub fn column_name(field: Field, statistic: Statistic) -> String {
        format!("{}_{}", field.name(), statistic.name())
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|(f, s)| Self::column_name(*f, *s))
            .collect()
    }

    pub fn has_column(&self, field: Field, statistic: Statistic) -> bool {
        self.column_position(field, statistic).is_some()
    }

    fn column_position(&self, field: Field, statistic: Statistic) -> Option<usize> {
        self.columns
            .iter()
            .position(|(f, s)| *f == field && *s == statistic)
    }

    /// Values of one statistic column paired with their bucket keys
    pub fn series(&self, field: Field, statistic: Statistic) -> Option<Vec<(BucketKey, Option<f64>)>> {
        let idx = self.column_position(field, statistic)?;
        Some(self.rows.iter().map(|r| (r.key, r.values[idx])).collect())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
