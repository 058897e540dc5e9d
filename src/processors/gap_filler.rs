use serde::Serialize;
use tracing::{debug, info, warn};

use crate::models::{Field, ObservationTable};

/// Copy the nearest earlier known value into each gap
pub fn forward_fill(values: &mut [Option<f64>]) -> usize {
    let mut filled = 0;
    let mut last = None;
    for value in values.iter_mut() {
        if let Some(v) = *value {
            last = Some(v);
        } else if let Some(known) = last {
            *value = Some(known);
            filled += 1;
        }
    }
    filled
}

/// Copy the nearest later known value into each gap (only leading gaps remain after a forward fill)
pub fn backward_fill(values: &mut [Option<f64>]) -> usize {
    let mut filled = 0;
    let mut next = None;
    for value in values.iter_mut().rev() {
        if let Some(v) = *value {
            next = Some(v);
        } else if let Some(known) = next {
            *value = Some(known);
            filled += 1;
        }
    }
    filled
}

/// Arithmetic mean of the known values, `None` for an all-missing column
pub fn column_mean(values: &[Option<f64>]) -> Option<f64> {
    let known: Vec<f64> = values.iter().flatten().copied().collect();
    if known.is_empty() {
        None
    } else {
        Some(known.iter().sum::<f64>() / known.len() as f64)
    }
}

/// Fill remaining gaps with the column mean
pub fn mean_fill(values: &mut [Option<f64>]) -> usize {
    let Some(mean) = column_mean(values) else {
        return 0;
    };
    let mut filled = 0;
    for value in values.iter_mut().filter(|v| v.is_none()) {
        *value = Some(mean);
        filled += 1;
    }
    filled
}

/// Forward, then backward, then mean fill of one column
pub fn fill_gaps(values: &mut [Option<f64>]) -> FillCounts {
    FillCounts {
        forward: forward_fill(values),
        backward: backward_fill(values),
        mean: mean_fill(values),
        still_missing: values.iter().filter(|v| v.is_none()).count(),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FillCounts {
    pub forward: usize,
    pub backward: usize,
    pub mean: usize,
    pub still_missing: usize,
}

impl FillCounts {
    pub fn total_filled(&self) -> usize {
        self.forward + self.backward + self.mean
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GapFillReport {
    pub fields: Vec<(Field, FillCounts)>,
}

/// Repairs missing numeric cells of every present field in timestamp order
pub struct GapFiller;

impl GapFiller {
    pub fn new() -> Self {
        Self
    }

    pub fn fill(&self, table: &mut ObservationTable) -> GapFillReport {
        let mut report = GapFillReport::default();

        for column in table.columns.iter_mut() {
            let counts = fill_gaps(&mut column.values);

            if counts.still_missing > 0 {
                warn!(
                    "Field {} has no known values; it stays empty and is not aggregated",
                    column.field
                );
            } else if counts.total_filled() > 0 {
                info!(
                    "Filled {} missing {} values (forward {}, backward {}, mean {})",
                    counts.total_filled(),
                    column.field,
                    counts.forward,
                    counts.backward,
                    counts.mean
                );
            } else {
                debug!("Field {} had no gaps", column.field);
            }

            report.fields.push((column.field, counts));
        }

        report
    }
}

impl Default for GapFiller {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_forward_then_backward_then_mean() {
        let mut values = vec![None, Some(5.0), None, Some(10.0), None];
        let counts = fill_gaps(&mut values);

        assert_eq!(
            values,
            vec![Some(5.0), Some(5.0), Some(5.0), Some(10.0), Some(10.0)]
        );
        assert_eq!(counts.forward, 2);
        assert_eq!(counts.backward, 1);
        assert_eq!(counts.mean, 0);
    }

    #[test]
    fn test_individual_passes() {
        let mut values = vec![None, Some(1.0), None];
        assert_eq!(forward_fill(&mut values), 1);
        assert_eq!(values, vec![None, Some(1.0), Some(1.0)]);

        let mut values = vec![None, None, Some(2.0), None];
        assert_eq!(backward_fill(&mut values), 2);
        assert_eq!(values, vec![Some(2.0), Some(2.0), Some(2.0), None]);

        let mut values = vec![Some(1.0), None, Some(3.0)];
        assert_eq!(mean_fill(&mut values), 1);
        assert_eq!(values[1], Some(2.0));
    }

    #[test]
    fn test_all_missing_column_stays_missing() {
        let mut values = vec![None, None, None];
        let counts = fill_gaps(&mut values);

        assert_eq!(values, vec![None, None, None]);
        assert_eq!(counts.still_missing, 3);
        assert_eq!(column_mean(&values), None);
    }

    #[test]
    fn test_fill_is_noop_on_complete_column() {
        let mut values = vec![Some(1.0), Some(2.0)];
        assert_eq!(fill_gaps(&mut values).total_filled(), 0);
    }

    #[test]
    fn test_gap_filler_on_table() {
        let ts = |d| {
            NaiveDate::from_ymd_opt(2024, 1, d)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        };
        let mut table = ObservationTable::new(vec![ts(1), ts(2), ts(3)]);
        table.set_column(Field::Temperature, vec![Some(1.0), None, Some(3.0)]);
        table.set_column(Field::Humidity, vec![None, None, None]);

        let report = GapFiller::new().fill(&mut table);

        assert_eq!(table.value(Field::Temperature, 1), Some(1.0));
        assert!(!table.column(Field::Humidity).unwrap().has_data());
        assert_eq!(report.fields.len(), 2);
    }
}
