use chrono::{Datelike, NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::models::{
    AggregateKind, AggregateRow, AggregateTable, BucketKey, Field, ObservationTable, Season,
    Statistic,
};

/// Fields that are summarised, in output column order
pub const AGGREGATED_FIELDS: [Field; 3] = [Field::Temperature, Field::Rainfall, Field::Humidity];

/// Compute one statistic over a bucket's samples.
///
/// Empty buckets yield `None` for every statistic; `Std` is the sample
/// standard deviation and needs at least two samples.
pub fn compute_statistic(statistic: Statistic, samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let n = samples.len() as f64;
    let sum: f64 = samples.iter().sum();

    match statistic {
        Statistic::Sum => Some(sum),
        Statistic::Mean => Some(sum / n),
        Statistic::Min => samples.iter().copied().reduce(f64::min),
        Statistic::Max => samples.iter().copied().reduce(f64::max),
        Statistic::Std => {
            if samples.len() < 2 {
                return None;
            }
            let mean = sum / n;
            let squares: f64 = samples.iter().map(|v| (v - mean).powi(2)).sum();
            Some((squares / (n - 1.0)).sqrt())
        }
    }
}

fn month_end(date: NaiveDate) -> Option<NaiveDate> {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)?.pred_opt()
}

fn year_end(date: NaiveDate) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year(), 12, 31)
}

/// Bucket a timestamp falls into for a given view
pub fn bucket_of(kind: AggregateKind, timestamp: &NaiveDateTime) -> Option<BucketKey> {
    let date = timestamp.date();
    match kind {
        AggregateKind::Daily => Some(BucketKey::Day(date)),
        AggregateKind::Monthly => month_end(date).map(BucketKey::Month),
        AggregateKind::Yearly => year_end(date).map(BucketKey::Year),
        AggregateKind::ByMonth => Some(BucketKey::MonthOfYear(date.month())),
        AggregateKind::BySeason => Some(BucketKey::Season(Season::from_month(date.month()))),
    }
}

/// Every calendar period between two buckets, inclusive
fn period_range(kind: AggregateKind, first: BucketKey, last: BucketKey) -> Vec<BucketKey> {
    let (Some(start), Some(stop)) = (first.date(), last.date()) else {
        return Vec::new();
    };

    let mut keys = Vec::new();
    let mut cursor = Some(start);
    while let Some(date) = cursor {
        if date > stop {
            break;
        }
        let next = date.succ_opt();
        match kind {
            AggregateKind::Daily => {
                keys.push(BucketKey::Day(date));
                cursor = next;
            }
            AggregateKind::Monthly => {
                keys.push(BucketKey::Month(date));
                cursor = next.and_then(month_end);
            }
            AggregateKind::Yearly => {
                keys.push(BucketKey::Year(date));
                cursor = next.and_then(year_end);
            }
            AggregateKind::ByMonth | AggregateKind::BySeason => break,
        }
    }
    keys
}

/// The five aggregate views of one dataset
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateSet {
    pub daily: AggregateTable,
    pub monthly: AggregateTable,
    pub yearly: AggregateTable,
    pub by_month: AggregateTable,
    pub by_season: AggregateTable,
}

impl AggregateSet {
    pub fn get(&self, kind: AggregateKind) -> &AggregateTable {
        match kind {
            AggregateKind::Daily => &self.daily,
            AggregateKind::Monthly => &self.monthly,
            AggregateKind::Yearly => &self.yearly,
            AggregateKind::ByMonth => &self.by_month,
            AggregateKind::BySeason => &self.by_season,
        }
    }

    pub fn tables(&self) -> impl Iterator<Item = &AggregateTable> {
        AggregateKind::ALL.into_iter().map(move |kind| self.get(kind))
    }
}

/// Resamples and groups the cleaned observations into summary tables
pub struct Aggregator;

impl Aggregator {
    pub fn new() -> Self {
        Self
    }

    /// Fields with at least one known value, in output order
    pub fn aggregated_fields(&self, table: &ObservationTable) -> Vec<Field> {
        AGGREGATED_FIELDS
            .into_iter()
            .filter(|field| table.column(*field).is_some_and(|c| c.has_data()))
            .collect()
    }

    pub fn aggregate_all(&self, table: &ObservationTable) -> AggregateSet {
        let set = AggregateSet {
            daily: self.aggregate(table, AggregateKind::Daily),
            monthly: self.aggregate(table, AggregateKind::Monthly),
            yearly: self.aggregate(table, AggregateKind::Yearly),
            by_month: self.aggregate(table, AggregateKind::ByMonth),
            by_season: self.aggregate(table, AggregateKind::BySeason),
        };
        info!(
            "Aggregated {} days, {} months, {} years, {} calendar months, {} seasons",
            set.daily.len(),
            set.monthly.len(),
            set.yearly.len(),
            set.by_month.len(),
            set.by_season.len()
        );
        set
    }

    pub fn aggregate(&self, table: &ObservationTable, kind: AggregateKind) -> AggregateTable {
        let fields = self.aggregated_fields(table);
        let columns: Vec<(Field, Statistic)> = fields
            .iter()
            .flat_map(|field| kind.statistics(*field).iter().map(move |s| (*field, *s)))
            .collect();
        let mut output = AggregateTable::new(kind, columns);

        let mut buckets: BTreeMap<BucketKey, Vec<usize>> = BTreeMap::new();
        for (row, timestamp) in table.timestamps.iter().enumerate() {
            if let Some(key) = bucket_of(kind, timestamp) {
                buckets.entry(key).or_default().push(row);
            }
        }

        let keys: Vec<BucketKey> = if kind.is_grouped() {
            buckets.keys().copied().collect()
        } else {
            match (buckets.keys().next(), buckets.keys().next_back()) {
                (Some(first), Some(last)) => period_range(kind, *first, *last),
                _ => Vec::new(),
            }
        };

        let empty = Vec::new();
        for key in keys {
            let rows = buckets.get(&key).unwrap_or(&empty);
            let values = output
                .columns
                .iter()
                .map(|(field, statistic)| {
                    let samples: Vec<f64> = rows
                        .iter()
                        .filter_map(|&row| table.value(*field, row))
                        .collect();
                    compute_statistic(*statistic, &samples)
                })
                .collect();
            output.rows.push(AggregateRow { key, values });
        }

        debug!(
            "{} view: {} buckets x {} columns",
            kind.artifact_stem(),
            output.len(),
            output.columns.len()
        );
        output
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}
