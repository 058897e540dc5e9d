pub mod aggregator;
pub mod column_resolver;
pub mod gap_filler;
pub mod pipeline;
pub mod schema_normalizer;
pub mod temporal_parser;

pub use aggregator::{AggregateSet, Aggregator};
pub use column_resolver::ColumnResolver;
pub use gap_filler::{FillCounts, GapFillReport, GapFiller};
pub use pipeline::{AnalysisPipeline, FailedArtifact, Inspection, PreparedData, RunSummary};
pub use schema_normalizer::SchemaNormalizer;
pub use temporal_parser::{DateParseReport, ParseStrategy, TemporalParser, TimestampedRows};
