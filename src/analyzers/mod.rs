pub mod report_builder;

pub use report_builder::{hottest_day, wettest_month, InsightError, ReportBuilder, ReportContext};
