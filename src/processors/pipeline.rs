use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::analyzers::{ReportBuilder, ReportContext};
use crate::config::AnalysisConfig;
use crate::error::{ProcessingError, Result};
use crate::models::{CanonicalObservation, ColumnRole, ColumnRoleMap, Field, ObservationTable};
use crate::processors::aggregator::Aggregator;
use crate::processors::column_resolver::ColumnResolver;
use crate::processors::gap_filler::{GapFillReport, GapFiller};
use crate::processors::schema_normalizer::SchemaNormalizer;
use crate::processors::temporal_parser::{DateParseReport, TemporalParser};
use crate::readers::TableReader;
use crate::utils::filename::{cleaned_file_name, summary_file_name};
use crate::utils::progress::ProgressReporter;
use crate::writers::{plan_charts, ChartWriter, TableWriter};

/// Normalized data before gap filling, shared by `analyze` and `inspect`
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub source_name: String,
    pub input_rows: usize,
    pub roles: ColumnRoleMap,
    pub parse_report: DateParseReport,
    pub table: ObservationTable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldInspection {
    pub field: Field,
    pub missing: usize,
    pub total: usize,
}

/// Diagnostics of the resolve/parse/normalize stages; nothing is written
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inspection {
    pub source_name: String,
    pub input_rows: usize,
    pub roles: ColumnRoleMap,
    pub date_parse: DateParseReport,
    pub fields: Vec<FieldInspection>,
    /// First rows after normalization, before gap filling
    pub sample: Vec<CanonicalObservation>,
}

impl Inspection {
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("Source: {} ({} rows)", self.source_name, self.input_rows),
            "Detected columns:".to_string(),
            self.roles.summary(),
            format!(
                "Dates: {}/{} parsed with {}, {} dropped",
                self.date_parse.parsed_rows,
                self.date_parse.total_rows,
                self.date_parse.strategy,
                self.date_parse.dropped_rows
            ),
            "Fields:".to_string(),
        ];
        for f in &self.fields {
            lines.push(format!("  {}: {} of {} missing", f.field, f.missing, f.total));
        }
        if !self.sample.is_empty() {
            lines.push(format!("First {} rows:", self.sample.len()));
            for row in &self.sample {
                lines.push(format!(
                    "  {} temperature={} rainfall={} humidity={}",
                    row.timestamp,
                    show(row.temperature),
                    show(row.rainfall),
                    show(row.humidity)
                ));
            }
        }
        lines.join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedArtifact {
    pub name: String,
    pub reason: String,
}

/// Outcome of a full analysis run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub source_name: String,
    pub input_rows: usize,
    pub rows_after_cleaning: usize,
    pub dropped_rows: usize,
    pub parse_strategy: String,
    pub fill: GapFillReport,
    pub fields_aggregated: Vec<Field>,
    pub output_dir: PathBuf,
    pub artifacts_written: Vec<String>,
    pub artifacts_failed: Vec<FailedArtifact>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.artifacts_failed.is_empty()
    }

    pub fn summary(&self) -> String {
        let fields: Vec<&str> = self.fields_aggregated.iter().map(|f| f.name()).collect();
        let mut text = format!(
            "Source: {}\n\
            Rows: {} read, {} after cleaning ({} dropped, dates parsed with {})\n\
            Aggregated fields: {}\n\
            Artifacts written to {}: {}",
            self.source_name,
            self.input_rows,
            self.rows_after_cleaning,
            self.dropped_rows,
            self.parse_strategy,
            if fields.is_empty() { "none".to_string() } else { fields.join(", ") },
            self.output_dir.display(),
            self.artifacts_written.len()
        );
        for failed in &self.artifacts_failed {
            text.push_str(&format!("\nFailed: {} ({})", failed.name, failed.reason));
        }
        text
    }
}

/// Runs the analysis stages in order for one configured input
pub struct AnalysisPipeline {
    config: AnalysisConfig,
}

impl AnalysisPipeline {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Read, resolve, parse and normalize the input.
    ///
    /// Fails before anything is written when the input is missing or no
    /// numeric column can be resolved.
    pub fn prepare(&self, progress: &ProgressReporter) -> Result<PreparedData> {
        progress.set_message("Reading input...");
        let raw = TableReader::with_delimiter(self.config.delimiter_byte())
            .read_table(&self.config.input)?;
        let source_name = raw.source_name.clone();
        let input_rows = raw.len();
        info!("Loaded {} with shape: ({}, {})", source_name, input_rows, raw.headers.len());

        progress.set_message("Detecting columns...");
        let roles = ColumnResolver::new().resolve(&raw.headers);
        if !roles.has_numeric_role() {
            return Err(ProcessingError::NoNumericFields);
        }
        let date_index = roles
            .position(ColumnRole::Date)
            .ok_or_else(|| ProcessingError::MissingData("no date column".to_string()))?;

        progress.set_message("Parsing dates...");
        let rows = TemporalParser::new().parse(raw, date_index)?;

        progress.set_message("Normalizing fields...");
        let table = SchemaNormalizer::new().normalize(&rows, &roles)?;

        Ok(PreparedData {
            source_name,
            input_rows,
            roles,
            parse_report: rows.report,
            table,
        })
    }

    /// Diagnostics plus the first `sample` normalized rows
    pub fn inspect(&self, progress: &ProgressReporter, sample: usize) -> Result<Inspection> {
        let prepared = self.prepare(progress)?;
        let rows = prepared.table.rows().take(sample).collect();
        let fields = prepared
            .table
            .columns
            .iter()
            .map(|c| FieldInspection {
                field: c.field,
                missing: c.missing_count(),
                total: c.values.len(),
            })
            .collect();

        Ok(Inspection {
            source_name: prepared.source_name,
            input_rows: prepared.input_rows,
            roles: prepared.roles,
            date_parse: prepared.parse_report,
            fields,
            sample: rows,
        })
    }

    /// Full run. CSV and report write failures abort; chart failures are
    /// recorded in the summary.
    pub fn run(&self, progress: &ProgressReporter) -> Result<RunSummary> {
        let prepared = self.prepare(progress)?;
        let mut table = prepared.table;

        progress.set_message("Filling gaps...");
        let fill = GapFiller::new().fill(&mut table);

        let output_dir = &self.config.output_dir;
        fs::create_dir_all(output_dir)?;

        let mut summary = RunSummary {
            source_name: prepared.source_name,
            input_rows: prepared.input_rows,
            rows_after_cleaning: table.len(),
            dropped_rows: prepared.parse_report.dropped_rows,
            parse_strategy: prepared.parse_report.strategy.to_string(),
            fill,
            output_dir: output_dir.clone(),
            ..RunSummary::default()
        };

        progress.set_message("Writing cleaned data...");
        let writer = TableWriter::new();
        let cleaned_name = cleaned_file_name(&self.config.input);
        writer.write_cleaned(&table, &output_dir.join(&cleaned_name))?;
        record_written(&mut summary, cleaned_name);

        progress.set_message("Aggregating...");
        let aggregator = Aggregator::new();
        summary.fields_aggregated = aggregator.aggregated_fields(&table);
        let aggregates = aggregator.aggregate_all(&table);

        for aggregate in aggregates.tables() {
            if aggregate.kind.is_grouped() && aggregate.is_empty() {
                continue;
            }
            let name = summary_file_name(aggregate.kind);
            writer.write_aggregate(aggregate, &output_dir.join(&name))?;
            record_written(&mut summary, name);
        }

        if self.config.charts {
            progress.set_message("Rendering charts...");
            let charts = ChartWriter::new(self.config.chart_width, self.config.chart_height);
            for plan in plan_charts(&aggregates) {
                let name = plan.kind.file_name().to_string();
                match charts.render(&plan, &output_dir.join(&name)) {
                    Ok(()) => record_written(&mut summary, name),
                    Err(e) => {
                        error!("Failed to render {}: {}", name, e);
                        summary.artifacts_failed.push(FailedArtifact {
                            name,
                            reason: e.to_string(),
                        });
                    }
                }
            }
        } else {
            info!("Charts disabled");
        }

        progress.set_message("Writing report...");
        let report_name = self.config.report_name.clone();
        let mut artifacts = summary.artifacts_written.clone();
        artifacts.push(report_name.clone());
        let context = ReportContext {
            source_name: summary.source_name.clone(),
            rows_after_cleaning: table.len(),
            date_range: table.date_range(),
            artifacts,
        };
        ReportBuilder::new().write(
            &context,
            &aggregates.daily,
            &aggregates.monthly,
            &self.config.report_path(),
        )?;
        summary.artifacts_written.push(report_name);

        info!("All done, outputs are in: {}", display_dir(output_dir));
        Ok(summary)
    }
}

fn show(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn record_written(summary: &mut RunSummary, name: String) {
    info!("Saved: {}", name);
    summary.artifacts_written.push(name);
}

fn display_dir(dir: &Path) -> String {
    fs::canonicalize(dir)
        .unwrap_or_else(|_| dir.to_path_buf())
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn config_for(input: &Path, output_dir: &Path) -> AnalysisConfig {
        AnalysisConfig {
            input: input.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            charts: false,
            ..AnalysisConfig::default()
        }
    }

    #[test]
    fn test_missing_input_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let output_dir = dir.path().join("out");
        let pipeline = AnalysisPipeline::new(config_for(&dir.path().join("nope.csv"), &output_dir));

        let err = pipeline.run(&ProgressReporter::silent()).unwrap_err();
        assert!(matches!(err, ProcessingError::InputNotFound { .. }));
        assert!(!output_dir.exists());
    }

    #[test]
    fn test_no_numeric_fields_writes_nothing() -> Result<()> {
        let dir = TempDir::new()?;
        let mut input = NamedTempFile::new()?;
        writeln!(input, "date,station")?;
        writeln!(input, "2024-01-01,A")?;

        let output_dir = dir.path().join("out");
        let pipeline = AnalysisPipeline::new(config_for(input.path(), &output_dir));
        let err = pipeline.run(&ProgressReporter::silent()).unwrap_err();

        assert!(matches!(err, ProcessingError::NoNumericFields));
        assert!(!output_dir.exists());
        Ok(())
    }

    #[test]
    fn test_inspect() -> Result<()> {
        let mut input = NamedTempFile::new()?;
        writeln!(input, "Date,Temp,Humidity")?;
        writeln!(input, "2024-01-01,10,")?;
        writeln!(input, "not a date,11,50")?;
        writeln!(input, "2024-01-03,,60")?;

        let dir = TempDir::new()?;
        let pipeline = AnalysisPipeline::new(config_for(input.path(), dir.path()));
        let inspection = pipeline.inspect(&ProgressReporter::silent(), 2)?;

        assert_eq!(inspection.input_rows, 3);
        assert_eq!(inspection.date_parse.dropped_rows, 1);
        assert_eq!(inspection.roles.temperature_mean.as_deref(), Some("Temp"));
        assert!(inspection.fields.contains(&FieldInspection {
            field: Field::Temperature,
            missing: 1,
            total: 2,
        }));
        assert!(inspection.summary().contains("Dates: 2/3 parsed"));
        assert_eq!(inspection.sample.len(), 2);
        assert_eq!(inspection.sample[1].temperature, None);
        assert_eq!(inspection.sample[1].humidity, Some(60.0));
        Ok(())
    }

    #[test]
    fn test_inspect_shows_missing_rainfall() -> Result<()> {
        let mut input = NamedTempFile::new()?;
        writeln!(input, "date,temp,rain")?;
        writeln!(input, "2024-01-01,10,")?;
        writeln!(input, "2024-01-02,11,n/a")?;

        let dir = TempDir::new()?;
        let pipeline = AnalysisPipeline::new(config_for(input.path(), dir.path()));
        let inspection = pipeline.inspect(&ProgressReporter::silent(), 5)?;

        assert!(inspection.sample.iter().all(|row| row.rainfall.is_none()));
        assert!(inspection.summary().contains("temperature=10 rainfall=- humidity=-"));
        Ok(())
    }

    #[test]
    fn test_run_lists_artifacts() -> Result<()> {
        let mut input = NamedTempFile::new()?;
        writeln!(input, "date,temperature,rainfall")?;
        writeln!(input, "2024-01-01,10,0")?;
        writeln!(input, "2024-01-02,20,5")?;

        let dir = TempDir::new()?;
        let pipeline = AnalysisPipeline::new(config_for(input.path(), dir.path()));
        let summary = pipeline.run(&ProgressReporter::silent())?;

        assert!(summary.is_success());
        assert_eq!(summary.rows_after_cleaning, 2);
        assert_eq!(summary.fields_aggregated, vec![Field::Temperature, Field::Rainfall]);
        assert_eq!(summary.artifacts_written.len(), 7);
        assert_eq!(summary.artifacts_written.last().map(String::as_str), Some("report.md"));
        for name in &summary.artifacts_written {
            assert!(dir.path().join(name).is_file(), "{} missing", name);
        }
        Ok(())
    }
}
