use chrono::NaiveDate;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use crate::error::Result;
use crate::models::{AggregateTable, BucketKey, Field, Statistic};

/// Why an insight could not be derived from a computed statistic
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InsightError {
    #[error("{column} has no finite values")]
    NoFiniteValues { column: String },

    #[error("{column} has an unexpected bucket key")]
    UnexpectedKey { column: String },
}

/// Bucket holding the largest finite value; the earliest bucket wins ties.
///
/// `Ok(None)` when the statistic was never computed.
fn arg_max(
    table: &AggregateTable,
    field: Field,
    statistic: Statistic,
) -> std::result::Result<Option<BucketKey>, InsightError> {
    let Some(series) = table.series(field, statistic) else {
        return Ok(None);
    };

    let mut best: Option<(BucketKey, f64)> = None;
    for (key, value) in series {
        let Some(value) = value.filter(|v| v.is_finite()) else {
            continue;
        };
        if best.map_or(true, |(_, current)| value > current) {
            best = Some((key, value));
        }
    }

    match best {
        Some((key, _)) => Ok(Some(key)),
        None => Err(InsightError::NoFiniteValues {
            column: AggregateTable::column_name(field, statistic),
        }),
    }
}

/// Day with the highest daily maximum temperature
pub fn hottest_day(daily: &AggregateTable) -> std::result::Result<Option<NaiveDate>, InsightError> {
    match arg_max(daily, Field::Temperature, Statistic::Max)? {
        Some(BucketKey::Day(date)) => Ok(Some(date)),
        Some(_) => Err(InsightError::UnexpectedKey {
            column: AggregateTable::column_name(Field::Temperature, Statistic::Max),
        }),
        None => Ok(None),
    }
}

/// Month (`YYYY-MM`) with the highest rainfall total
pub fn wettest_month(monthly: &AggregateTable) -> std::result::Result<Option<String>, InsightError> {
    match arg_max(monthly, Field::Rainfall, Statistic::Sum)? {
        Some(key @ BucketKey::Month(_)) => Ok(Some(key.month_label())),
        Some(_) => Err(InsightError::UnexpectedKey {
            column: AggregateTable::column_name(Field::Rainfall, Statistic::Sum),
        }),
        None => Ok(None),
    }
}

/// What the report says about the run
#[derive(Debug, Clone, PartialEq)]
pub struct ReportContext {
    pub source_name: String,
    pub rows_after_cleaning: usize,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    /// Artifact file names; sorted and deduplicated when rendered
    pub artifacts: Vec<String>,
}

/// Builds the Markdown run report
pub struct ReportBuilder;

impl ReportBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn insight_lines(&self, daily: &AggregateTable, monthly: &AggregateTable) -> Vec<String> {
        let mut lines = Vec::new();
        let mut failed = false;

        match hottest_day(daily) {
            Ok(Some(date)) => lines.push(format!("- Hottest day (daily max): {}", date)),
            Ok(None) => {}
            Err(e) => {
                warn!("Hottest day insight unavailable: {}", e);
                failed = true;
            }
        }

        match wettest_month(monthly) {
            Ok(Some(month)) => lines.push(format!("- Wettest month: {}", month)),
            Ok(None) => {}
            Err(e) => {
                warn!("Wettest month insight unavailable: {}", e);
                failed = true;
            }
        }

        if failed {
            lines.push("- Some insights could not be computed.".to_string());
        }
        lines
    }

    pub fn build(
        &self,
        context: &ReportContext,
        daily: &AggregateTable,
        monthly: &AggregateTable,
    ) -> String {
        let mut artifacts = context.artifacts.clone();
        artifacts.sort();
        artifacts.dedup();

        let mut report = String::new();
        let _ = writeln!(report, "# Weather Analysis Report\n");
        let _ = writeln!(report, "Source file: `{}`\n", context.source_name);
        let _ = writeln!(report, "Rows after cleaning: {}\n", context.rows_after_cleaning);
        if let Some((start, end)) = context.date_range {
            let _ = writeln!(report, "Date range: {} to {}\n", start, end);
        }

        let _ = writeln!(report, "Files generated:\n");
        for name in &artifacts {
            let _ = writeln!(report, "- `{}`", name);
        }

        let _ = writeln!(report, "\nAutomatic insights:\n");
        for line in self.insight_lines(daily, monthly) {
            let _ = writeln!(report, "{}", line);
        }

        report
    }

    pub fn write(
        &self,
        context: &ReportContext,
        daily: &AggregateTable,
        monthly: &AggregateTable,
        path: &Path,
    ) -> Result<()> {
        fs::write(path, self.build(context, daily, monthly))?;
        info!("Report written to {}", path.display());
        Ok(())
    }
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AggregateKind, AggregateRow};
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn daily(max: &[Option<f64>]) -> AggregateTable {
        let mut table = AggregateTable::new(
            AggregateKind::Daily,
            vec![(Field::Temperature, Statistic::Max)],
        );
        for (i, v) in max.iter().enumerate() {
            table.rows.push(AggregateRow {
                key: BucketKey::Day(date(2024, 1, 1 + i as u32)),
                values: vec![*v],
            });
        }
        table
    }

    fn monthly(sums: &[Option<f64>]) -> AggregateTable {
        let ends = [date(2024, 1, 31), date(2024, 2, 29), date(2024, 3, 31)];
        let mut table = AggregateTable::new(
            AggregateKind::Monthly,
            vec![(Field::Rainfall, Statistic::Sum)],
        );
        for (end, v) in ends.iter().zip(sums) {
            table.rows.push(AggregateRow {
                key: BucketKey::Month(*end),
                values: vec![*v],
            });
        }
        table
    }

    #[test]
    fn test_hottest_day_ties_pick_earliest() {
        let table = daily(&[Some(10.0), Some(30.0), None, Some(30.0)]);
        assert_eq!(hottest_day(&table), Ok(Some(date(2024, 1, 2))));
    }

    #[test]
    fn test_wettest_month() {
        let table = monthly(&[Some(5.0), Some(12.5), Some(12.5)]);
        assert_eq!(wettest_month(&table), Ok(Some("2024-02".to_string())));
    }

    #[test]
    fn test_insight_omitted_when_not_computed() {
        let empty = AggregateTable::new(AggregateKind::Daily, Vec::new());
        assert_eq!(hottest_day(&empty), Ok(None));
        assert!(ReportBuilder::new()
            .insight_lines(&empty, &monthly(&[Some(1.0)]))
            .iter()
            .all(|l| !l.contains("Hottest")));
    }

    #[test]
    fn test_insight_failure_degrades_to_diagnostic() {
        let lines = ReportBuilder::new().insight_lines(&daily(&[None, None]), &monthly(&[Some(2.0)]));
        assert_eq!(
            lines,
            vec![
                "- Wettest month: 2024-01".to_string(),
                "- Some insights could not be computed.".to_string(),
            ]
        );
    }

    #[test]
    fn test_report_text() {
        let context = ReportContext {
            source_name: "weather_1.csv".to_string(),
            rows_after_cleaning: 3,
            date_range: Some((date(2024, 1, 1), date(2024, 1, 3))),
            artifacts: vec![
                "report.md".to_string(),
                "daily_summary.csv".to_string(),
                "cleaned_weather_1.csv".to_string(),
            ],
        };
        let report = ReportBuilder::new().build(
            &context,
            &daily(&[Some(10.0), Some(20.0), Some(30.0)]),
            &monthly(&[Some(5.0)]),
        );

        assert_eq!(
            report,
            "# Weather Analysis Report\n\n\
             Source file: `weather_1.csv`\n\n\
             Rows after cleaning: 3\n\n\
             Date range: 2024-01-01 to 2024-01-03\n\n\
             Files generated:\n\n\
             - `cleaned_weather_1.csv`\n\
             - `daily_summary.csv`\n\
             - `report.md`\n\
             \n\
             Automatic insights:\n\n\
             - Hottest day (daily max): 2024-01-03\n\
             - Wettest month: 2024-01\n"
        );
    }
}
