pub mod chart_writer;
pub mod table_writer;

pub use chart_writer::{plan_charts, ChartData, ChartKind, ChartPlan, ChartWriter};
pub use table_writer::TableWriter;
