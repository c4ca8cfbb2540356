//! CLI subcommand implementations.

pub mod clean;
pub mod config;
pub mod scrape;
pub mod summarize;
pub mod validate;
