use csv::WriterBuilder;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

use crate::error::Result;
use crate::models::{AggregateTable, ObservationTable};
use crate::utils::constants::{DEFAULT_BUFFER_SIZE, TIMESTAMP_COLUMN, TIMESTAMP_FORMAT};

/// Shortest text that parses back to the same `f64`; missing values are empty
pub fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => v.to_string(),
        _ => String::new(),
    }
}

/// Writes the cleaned dataset and the aggregate views as comma separated files
pub struct TableWriter;

impl TableWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn write_cleaned(&self, table: &ObservationTable, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        self.write_cleaned_to(table, BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file))?;
        debug!("Wrote {} cleaned rows to {}", table.len(), path.display());
        Ok(())
    }

    pub fn write_cleaned_to<W: Write>(&self, table: &ObservationTable, sink: W) -> Result<()> {
        let fields = table.fields();

        let mut writer = WriterBuilder::new().from_writer(sink);

        let mut header = vec![TIMESTAMP_COLUMN.to_string()];
        header.extend(fields.iter().map(|f| f.name().to_string()));
        writer.write_record(&header)?;

        for (row, timestamp) in table.timestamps.iter().enumerate() {
            let mut record = Vec::with_capacity(fields.len() + 1);
            record.push(timestamp.format(TIMESTAMP_FORMAT).to_string());
            record.extend(fields.iter().map(|f| format_value(table.value(*f, row))));
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }

    pub fn write_aggregate(&self, table: &AggregateTable, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        self.write_aggregate_to(table, BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file))?;
        debug!(
            "Wrote {} rows of {} to {}",
            table.len(),
            table.kind.artifact_stem(),
            path.display()
        );
        Ok(())
    }

    pub fn write_aggregate_to<W: Write>(&self, table: &AggregateTable, sink: W) -> Result<()> {
        let mut writer = WriterBuilder::new().from_writer(sink);

        let mut header = vec![table.kind.key_column().to_string()];
        header.extend(table.column_names());
        writer.write_record(&header)?;

        for row in &table.rows {
            let mut record = Vec::with_capacity(row.values.len() + 1);
            record.push(row.key.label());
            record.extend(row.values.iter().map(|v| format_value(*v)));
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }
}

impl Default for TableWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AggregateKind, AggregateRow, BucketKey, Field, Season, Statistic};
    use chrono::NaiveDate;

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(Some(20.0)), "20");
        assert_eq!(format_value(Some(0.1 + 0.2)), "0.30000000000000004");
        assert_eq!(format_value(Some(-2.5)), "-2.5");
        assert_eq!(format_value(None), "");
        assert_eq!(format_value(Some(f64::NAN)), "");
    }

    #[test]
    fn test_cleaned_output() -> Result<()> {
        let ts = |d| {
            NaiveDate::from_ymd_opt(2024, 1, d)
                .unwrap()
                .and_hms_opt(6, 30, 0)
                .unwrap()
        };
        let mut table = ObservationTable::new(vec![ts(1), ts(2)]);
        table.set_column(Field::Rainfall, vec![Some(0.0), Some(1.5)]);
        table.set_column(Field::Temperature, vec![Some(10.0), None]);

        let mut buffer = Vec::new();
        TableWriter::new().write_cleaned_to(&table, &mut buffer)?;

        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "timestamp,temperature,rainfall\n\
             2024-01-01 06:30:00,10,0\n\
             2024-01-02 06:30:00,,1.5\n"
        );
        Ok(())
    }

    #[test]
    fn test_aggregate_output() -> Result<()> {
        let mut table = AggregateTable::new(
            AggregateKind::BySeason,
            vec![
                (Field::Rainfall, Statistic::Sum),
                (Field::Rainfall, Statistic::Mean),
            ],
        );
        table.rows.push(AggregateRow {
            key: BucketKey::Season(Season::Djf),
            values: vec![Some(5.0), Some(2.5)],
        });
        table.rows.push(AggregateRow {
            key: BucketKey::Season(Season::Son),
            values: vec![Some(1.0), None],
        });

        let mut buffer = Vec::new();
        TableWriter::new().write_aggregate_to(&table, &mut buffer)?;

        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "season,rainfall_sum,rainfall_mean\nDJF,5,2.5\nSON,1,\n"
        );
        Ok(())
    }
}
