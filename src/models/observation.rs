use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical numeric field produced by the schema normalizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Temperature,
    MinTemperature,
    MaxTemperature,
    Rainfall,
    Humidity,
}

impl Field {
    /// Column order used for the cleaned table
    pub const ALL: [Field; 5] = [
        Field::Temperature,
        Field::MinTemperature,
        Field::MaxTemperature,
        Field::Rainfall,
        Field::Humidity,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::Temperature => "temperature",
            Field::MinTemperature => "min_temperature",
            Field::MaxTemperature => "max_temperature",
            Field::Rainfall => "rainfall",
            Field::Humidity => "humidity",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldColumn {
    pub field: Field,
    pub values: Vec<Option<f64>>,
}

impl FieldColumn {
    pub fn new(field: Field, values: Vec<Option<f64>>) -> Self {
        Self { field, values }
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }

    /// A column with no known value anywhere is kept but never aggregated
    pub fn has_data(&self) -> bool {
        self.values.iter().any(Option::is_some)
    }
}

/// One row of the cleaned dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalObservation {
    pub timestamp: NaiveDateTime,
    pub temperature: Option<f64>,
    pub min_temperature: Option<f64>,
    pub max_temperature: Option<f64>,
    pub rainfall: Option<f64>,
    pub humidity: Option<f64>,
}

/// Timestamp-ordered, column-oriented set of canonical observations.
///
/// Only fields that exist for the dataset have a column. Duplicate timestamps
/// are allowed and kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationTable {
    pub timestamps: Vec<NaiveDateTime>,
    pub columns: Vec<FieldColumn>,
}

impl ObservationTable {
    pub fn new(timestamps: Vec<NaiveDateTime>) -> Self {
        Self {
            timestamps,
            columns: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Insert or replace a field column, keeping canonical field order
    pub fn set_column(&mut self, field: Field, values: Vec<Option<f64>>) {
        debug_assert_eq!(values.len(), self.timestamps.len());
        self.columns.retain(|c| c.field != field);
        self.columns.push(FieldColumn::new(field, values));
        self.columns.sort_by_key(|c| c.field);
    }

    pub fn column(&self, field: Field) -> Option<&FieldColumn> {
        self.columns.iter().find(|c| c.field == field)
    }

    pub fn has_field(&self, field: Field) -> bool {
        self.column(field).is_some()
    }

    pub fn fields(&self) -> Vec<Field> {
        self.columns.iter().map(|c| c.field).collect()
    }

    pub fn value(&self, field: Field, row: usize) -> Option<f64> {
        self.column(field).and_then(|c| c.values.get(row).copied().flatten())
    }

    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.timestamps.iter().min()?;
        let max = self.timestamps.iter().max()?;
        Some((min.date(), max.date()))
    }

    pub fn rows(&self) -> impl Iterator<Item = CanonicalObservation> + '_ {
        self.timestamps
            .iter()
            .enumerate()
            .map(move |(i, ts)| CanonicalObservation {
                timestamp: *ts,
                temperature: self.value(Field::Temperature, i),
                min_temperature: self.value(Field::MinTemperature, i),
                max_temperature: self.value(Field::MaxTemperature, i),
                rainfall: self.value(Field::Rainfall, i),
                humidity: self.value(Field::Humidity, i),
            })
    }
}
