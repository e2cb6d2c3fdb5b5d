// Pipeline ingestion: reading the three raw sources into typed tables

pub mod readers;
pub mod source_loader;

pub use readers::{read_archive, read_metrics, read_predictions};
pub use source_loader::{SourceLoader, SourceLocation, SourceSet, SourceTables};
