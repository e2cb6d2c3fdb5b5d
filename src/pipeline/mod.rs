// Data wrangling pipeline: ingestion of the raw sources and the cleaning stages

pub mod ingestion;
pub mod processing;

pub use processing::clean_tables;
