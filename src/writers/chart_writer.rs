//! PNG charts of the aggregate views.
//!
//! Planning and rendering are separate: [`plan_charts`] decides which charts
//! have data and extracts their series, [`ChartWriter::render`] draws one plan
//! with `plotters`.

use plotters::prelude::*;
use std::ops::Range;
use std::path::Path;
use tracing::debug;

use crate::error::Result;
use crate::models::{AggregateTable, BucketKey, Field, Statistic};
use crate::processors::aggregator::AggregateSet;
use crate::utils::constants::{
    CHART_DAILY_TEMPERATURE, CHART_HUMIDITY_SCATTER, CHART_MONTHLY_COMBINED,
    CHART_MONTHLY_RAINFALL,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    DailyTemperature,
    MonthlyRainfall,
    HumidityScatter,
    MonthlyCombined,
}

impl ChartKind {
    pub const ALL: [ChartKind; 4] = [
        ChartKind::DailyTemperature,
        ChartKind::MonthlyRainfall,
        ChartKind::HumidityScatter,
        ChartKind::MonthlyCombined,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            ChartKind::DailyTemperature => CHART_DAILY_TEMPERATURE,
            ChartKind::MonthlyRainfall => CHART_MONTHLY_RAINFALL,
            ChartKind::HumidityScatter => CHART_HUMIDITY_SCATTER,
            ChartKind::MonthlyCombined => CHART_MONTHLY_COMBINED,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ChartKind::DailyTemperature => "Daily Mean Temperature",
            ChartKind::MonthlyRainfall => "Monthly Rainfall Totals",
            ChartKind::HumidityScatter => "Humidity vs Temperature (daily means)",
            ChartKind::MonthlyCombined => "Monthly Mean Temperature and Rainfall (combined)",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    /// One value per bucket, drawn as a line or as bars
    Series {
        labels: Vec<String>,
        values: Vec<Option<f64>>,
    },
    Scatter {
        points: Vec<(f64, f64)>,
    },
    /// Temperature line over rainfall bars on a secondary axis
    Combined {
        labels: Vec<String>,
        temperature: Vec<Option<f64>>,
        rainfall: Vec<Option<f64>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartPlan {
    pub kind: ChartKind,
    pub data: ChartData,
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Labels and finite-or-missing values of one statistic, if any value is finite
fn labelled_series(
    table: &AggregateTable,
    field: Field,
    statistic: Statistic,
    label: fn(&BucketKey) -> String,
) -> Option<(Vec<String>, Vec<Option<f64>>)> {
    let series = table.series(field, statistic)?;
    if !series.iter().any(|(_, v)| finite(*v).is_some()) {
        return None;
    }
    Some((
        series.iter().map(|(key, _)| label(key)).collect(),
        series.iter().map(|(_, v)| finite(*v)).collect(),
    ))
}

fn plan(kind: ChartKind, set: &AggregateSet) -> Option<ChartData> {
    match kind {
        ChartKind::DailyTemperature => {
            let (labels, values) =
                labelled_series(&set.daily, Field::Temperature, Statistic::Mean, BucketKey::label)?;
            Some(ChartData::Series { labels, values })
        }
        ChartKind::MonthlyRainfall => {
            let (labels, values) = labelled_series(
                &set.monthly,
                Field::Rainfall,
                Statistic::Sum,
                BucketKey::month_label,
            )?;
            Some(ChartData::Series { labels, values })
        }
        ChartKind::HumidityScatter => {
            let temperature = set.daily.series(Field::Temperature, Statistic::Mean)?;
            let humidity = set.daily.series(Field::Humidity, Statistic::Mean)?;
            let points: Vec<(f64, f64)> = temperature
                .iter()
                .zip(humidity.iter())
                .filter_map(|((_, t), (_, h))| Some((finite(*t)?, finite(*h)?)))
                .collect();
            (!points.is_empty()).then_some(ChartData::Scatter { points })
        }
        ChartKind::MonthlyCombined => {
            let (labels, temperature) = labelled_series(
                &set.monthly,
                Field::Temperature,
                Statistic::Mean,
                BucketKey::month_label,
            )?;
            let (_, rainfall) = labelled_series(
                &set.monthly,
                Field::Rainfall,
                Statistic::Sum,
                BucketKey::month_label,
            )?;
            Some(ChartData::Combined {
                labels,
                temperature,
                rainfall,
            })
        }
    }
}

/// Charts that have something to draw, in a fixed order
pub fn plan_charts(set: &AggregateSet) -> Vec<ChartPlan> {
    ChartKind::ALL
        .into_iter()
        .filter_map(|kind| match plan(kind, set) {
            Some(data) => Some(ChartPlan { kind, data }),
            None => {
                debug!("Skipping {}: no data to plot", kind.file_name());
                None
            }
        })
        .collect()
}

/// Value range with a margin; a flat range is widened so it can be drawn
fn padded_range(values: impl Iterator<Item = f64>, include_zero: bool) -> Range<f64> {
    let (mut min, mut max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    if include_zero {
        min = min.min(0.0);
        max = max.max(0.0);
    }
    let span = max - min;
    let margin = if span > 0.0 { span * 0.05 } else { 1.0 };
    (min - margin)..(max + margin)
}

fn index_range(len: usize) -> Range<f64> {
    -0.5..(len.max(1) as f64 - 0.5)
}

/// Contiguous runs of known values as (index, value) points
fn line_runs(values: &[Option<f64>]) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for (i, value) in values.iter().enumerate() {
        match value {
            Some(v) => current.push((i as f64, *v)),
            None if !current.is_empty() => runs.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

fn bars(values: &[Option<f64>], style: ShapeStyle) -> Vec<Rectangle<(f64, f64)>> {
    values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| {
            let x = i as f64;
            v.map(|v| Rectangle::new([(x - 0.4, 0.0), (x + 0.4, v)], style))
        })
        .collect()
}

fn label_at(labels: &[String], x: f64) -> String {
    let idx = x.round();
    if idx < 0.0 || (x - idx).abs() > 1e-6 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}

/// Renders chart plans to PNG files
pub struct ChartWriter {
    width: u32,
    height: u32,
}

impl ChartWriter {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn render(&self, plan: &ChartPlan, path: &Path) -> Result<()> {
        match &plan.data {
            ChartData::Series { labels, values } => match plan.kind {
                ChartKind::MonthlyRainfall => self.draw_bars(plan.kind, labels, values, path),
                _ => self.draw_line(plan.kind, labels, values, path),
            },
            ChartData::Scatter { points } => self.draw_scatter(plan.kind, points, path),
            ChartData::Combined {
                labels,
                temperature,
                rainfall,
            } => self.draw_combined(plan.kind, labels, temperature, rainfall, path),
        }?;
        debug!("Rendered chart {}", path.display());
        Ok(())
    }

    fn draw_line(
        &self,
        kind: ChartKind,
        labels: &[String],
        values: &[Option<f64>],
        path: &Path,
    ) -> Result<()> {
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let y_range = padded_range(values.iter().flatten().copied(), false);
        let mut chart = ChartBuilder::on(&root)
            .caption(kind.title(), ("sans-serif", 24).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(index_range(values.len()), y_range)?;

        let formatter = |x: &f64| label_at(labels, *x);
        chart
            .configure_mesh()
            .x_desc("Date")
            .y_desc("Temperature")
            .x_labels(8)
            .x_label_formatter(&formatter)
            .draw()?;

        for run in line_runs(values) {
            chart.draw_series(LineSeries::new(run, BLUE.stroke_width(2)).point_size(2))?;
        }

        root.present()?;
        Ok(())
    }

    fn draw_bars(
        &self,
        kind: ChartKind,
        labels: &[String],
        values: &[Option<f64>],
        path: &Path,
    ) -> Result<()> {
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let y_range = padded_range(values.iter().flatten().copied(), true);
        let mut chart = ChartBuilder::on(&root)
            .caption(kind.title(), ("sans-serif", 24).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(index_range(values.len()), y_range)?;

        let formatter = |x: &f64| label_at(labels, *x);
        chart
            .configure_mesh()
            .x_desc("Month")
            .y_desc("Rainfall (sum)")
            .x_labels(labels.len().min(12))
            .x_label_formatter(&formatter)
            .draw()?;

        chart.draw_series(bars(values, BLUE.filled()))?;

        root.present()?;
        Ok(())
    }

    fn draw_scatter(&self, kind: ChartKind, points: &[(f64, f64)], path: &Path) -> Result<()> {
        // Square canvas
        let side = self.height.max(self.width.min(600));
        let root = BitMapBackend::new(path, (side, side)).into_drawing_area();
        root.fill(&WHITE)?;

        let x_range = padded_range(points.iter().map(|(x, _)| *x), false);
        let y_range = padded_range(points.iter().map(|(_, y)| *y), false);
        let mut chart = ChartBuilder::on(&root)
            .caption(kind.title(), ("sans-serif", 20).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(x_range, y_range)?;

        chart
            .configure_mesh()
            .x_desc("Temperature (mean)")
            .y_desc("Humidity (mean)")
            .draw()?;

        chart.draw_series(
            points
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 3, BLUE.filled())),
        )?;

        root.present()?;
        Ok(())
    }

    fn draw_combined(
        &self,
        kind: ChartKind,
        labels: &[String],
        temperature: &[Option<f64>],
        rainfall: &[Option<f64>],
        path: &Path,
    ) -> Result<()> {
        let height = self.height + self.height / 4;
        let root = BitMapBackend::new(path, (self.width, height)).into_drawing_area();
        root.fill(&WHITE)?;

        let x_range = index_range(labels.len());
        let temperature_range = padded_range(temperature.iter().flatten().copied(), false);
        let rainfall_range = padded_range(rainfall.iter().flatten().copied(), true);

        let mut chart = ChartBuilder::on(&root)
            .caption(kind.title(), ("sans-serif", 24).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .right_y_label_area_size(50)
            .build_cartesian_2d(x_range.clone(), temperature_range)?
            .set_secondary_coord(x_range, rainfall_range);

        let formatter = |x: &f64| label_at(labels, *x);
        chart
            .configure_mesh()
            .x_desc("Month")
            .y_desc("Temperature (mean)")
            .x_labels(labels.len().min(12))
            .x_label_formatter(&formatter)
            .draw()?;
        chart
            .configure_secondary_axes()
            .y_desc("Rainfall (sum)")
            .draw()?;

        chart.draw_secondary_series(bars(rainfall, BLUE.mix(0.3).filled()))?;
        for run in line_runs(temperature) {
            chart.draw_series(LineSeries::new(run, RED.stroke_width(2)).point_size(3))?;
        }

        root.present()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ObservationTable;
    use crate::processors::Aggregator;
    use chrono::NaiveDate;

    fn set_with(fields: &[(Field, Vec<Option<f64>>)]) -> AggregateSet {
        let n = fields.first().map(|(_, v)| v.len()).unwrap_or(0);
        let timestamps = (0..n as u32)
            .map(|i| {
                NaiveDate::from_ymd_opt(2024, 1, 1 + i)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
            })
            .collect();
        let mut table = ObservationTable::new(timestamps);
        for (field, values) in fields {
            table.set_column(*field, values.clone());
        }
        Aggregator::new().aggregate_all(&table)
    }

    fn kinds(plans: &[ChartPlan]) -> Vec<ChartKind> {
        plans.iter().map(|p| p.kind).collect()
    }

    #[test]
    fn test_all_charts_planned() {
        let set = set_with(&[
            (Field::Temperature, vec![Some(10.0), Some(12.0)]),
            (Field::Rainfall, vec![Some(0.0), Some(3.0)]),
            (Field::Humidity, vec![Some(80.0), Some(70.0)]),
        ]);
        assert_eq!(kinds(&plan_charts(&set)), ChartKind::ALL.to_vec());
    }

    #[test]
    fn test_charts_skipped_without_data() {
        let set = set_with(&[(Field::Rainfall, vec![Some(1.0), Some(2.0)])]);
        assert_eq!(kinds(&plan_charts(&set)), vec![ChartKind::MonthlyRainfall]);

        let set = set_with(&[
            (Field::Temperature, vec![Some(10.0), Some(12.0)]),
            (Field::Rainfall, vec![Some(0.0), Some(0.0)]),
        ]);
        assert_eq!(
            kinds(&plan_charts(&set)),
            vec![
                ChartKind::DailyTemperature,
                ChartKind::MonthlyRainfall,
                ChartKind::MonthlyCombined
            ]
        );
    }

    #[test]
    fn test_monthly_labels() {
        let set = set_with(&[(Field::Rainfall, vec![Some(1.0), Some(2.0)])]);
        let plans = plan_charts(&set);
        match &plans[0].data {
            ChartData::Series { labels, values } => {
                assert_eq!(labels, &vec!["2024-01".to_string()]);
                assert_eq!(values, &vec![Some(3.0)]);
            }
            other => panic!("unexpected chart data {:?}", other),
        }
    }

    #[test]
    fn test_line_runs_break_at_gaps() {
        let runs = line_runs(&[Some(1.0), None, Some(2.0), Some(3.0), None]);
        assert_eq!(runs, vec![vec![(0.0, 1.0)], vec![(2.0, 2.0), (3.0, 3.0)]]);
    }

    #[test]
    fn test_padded_range() {
        assert_eq!(padded_range([5.0, 5.0].into_iter(), false), 4.0..6.0);
        let range = padded_range([2.0, 12.0].into_iter(), true);
        assert!((range.start + 0.6).abs() < 1e-9);
        assert!((range.end - 12.6).abs() < 1e-9);
        assert_eq!(padded_range(std::iter::empty(), false), 0.0..1.0);
    }

    #[test]
    fn test_label_at() {
        let labels = vec!["a".to_string(), "b".to_string()];
        assert_eq!(label_at(&labels, 1.0), "b");
        assert_eq!(label_at(&labels, 0.5), "");
        assert_eq!(label_at(&labels, 5.0), "");
        assert_eq!(label_at(&labels, -1.0), "");
    }
}
