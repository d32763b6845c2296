//! Tabular input: date-keyed tables, column partition, and file loading

pub mod ingest;
pub mod schema;
pub mod table;

pub use ingest::{load_feed, DataIngestor, LoadError};
pub use schema::{ColumnPartition, DailySchema};
pub use table::{DateKey, DatedRow, DatedTable};
