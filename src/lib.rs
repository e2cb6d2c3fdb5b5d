pub mod analysis;
pub mod app;
pub mod config;
pub mod constants;
pub mod domain;
pub mod error;
pub mod infra;
pub mod observability;
pub mod pipeline;
