use tracing::{debug, info};

use crate::error::{ProcessingError, Result};
use crate::models::{ColumnRole, ColumnRoleMap, Field, ObservationTable, RawTable};
use crate::processors::temporal_parser::TimestampedRows;

/// Coerce a raw cell to a number; anything unparseable or non-finite is missing
pub fn coerce_numeric(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Row-wise mean of two columns; missing if either side is missing
pub fn row_mean(a: &[Option<f64>], b: &[Option<f64>]) -> Vec<Option<f64>> {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => Some((x + y) / 2.0),
            _ => None,
        })
        .collect()
}

/// Maps resolved source columns onto the canonical numeric fields
pub struct SchemaNormalizer;

impl SchemaNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, rows: &TimestampedRows, roles: &ColumnRoleMap) -> Result<ObservationTable> {
        let raw = &rows.table;
        let mut table = ObservationTable::new(rows.timestamps.clone());
        let coerce = |role: ColumnRole| -> Result<Option<Vec<Option<f64>>>> {
            roles
                .position(role)
                .map(|index| coerce_column(raw, index))
                .transpose()
        };

        let mean = coerce(ColumnRole::TemperatureMean)?;
        let min = coerce(ColumnRole::TemperatureMin)?;
        let max = coerce(ColumnRole::TemperatureMax)?;

        match (mean, min, max) {
            (Some(mean), min, max) => {
                table.set_column(Field::Temperature, mean);
                // Min/max are kept alongside a direct mean column when present
                if let Some(min) = min {
                    table.set_column(Field::MinTemperature, min);
                }
                if let Some(max) = max {
                    table.set_column(Field::MaxTemperature, max);
                }
            }
            (None, Some(min), Some(max)) => {
                info!("No mean temperature column, averaging min and max");
                table.set_column(Field::Temperature, row_mean(&min, &max));
                table.set_column(Field::MinTemperature, min);
                table.set_column(Field::MaxTemperature, max);
            }
            (None, min, max) => {
                if let Some(min) = min {
                    table.set_column(Field::MinTemperature, min);
                }
                if let Some(max) = max {
                    table.set_column(Field::MaxTemperature, max);
                }
            }
        }

        match coerce(ColumnRole::Rainfall)? {
            Some(rain) => table.set_column(Field::Rainfall, rain),
            None => {
                debug!("No rainfall column, defaulting rainfall to 0");
                table.set_column(Field::Rainfall, vec![Some(0.0); table.len()]);
            }
        }

        if let Some(humidity) = coerce(ColumnRole::Humidity)? {
            table.set_column(Field::Humidity, humidity);
        }

        for column in &table.columns {
            debug!(
                "Field {}: {} of {} cells missing after coercion",
                column.field,
                column.missing_count(),
                column.values.len()
            );
        }

        Ok(table)
    }
}

impl Default for SchemaNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

fn coerce_column(raw: &RawTable, index: usize) -> Result<Vec<Option<f64>>> {
    let cells = raw
        .column(index)
        .ok_or_else(|| ProcessingError::MissingData(format!("column {} not found", index)))?;
    Ok(cells.into_iter().map(coerce_numeric).collect())
}
