pub mod aggregate;
pub mod observation;
pub mod raw;
pub mod roles;

pub use aggregate::{AggregateKind, AggregateRow, AggregateTable, BucketKey, Season, Statistic};
pub use observation::{CanonicalObservation, Field, FieldColumn, ObservationTable};
pub use raw::RawTable;
pub use roles::{ColumnRole, ColumnRoleMap};
