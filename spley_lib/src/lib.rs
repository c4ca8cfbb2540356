//! Library layer for the SPLEY bill scraper: navigation, extraction,
//! normalization, validation and export of Peruvian Congress bills.
//!
//! Drives a [`spley_portal::Browser`] through the portal's search form and
//! paginated results, turning each table row into a cleaned, validated
//! [`CleanRecord`].

pub mod config;
pub mod connectivity;
pub mod error;
pub mod export;
pub mod extract;
pub mod monitor;
pub mod navigator;
pub mod normalize;
pub mod notify;
pub mod record;
pub mod retry;
pub mod scrape;
pub mod stats;
pub mod summary;
pub mod validation;

#[cfg(test)]
mod testing;

pub use spley_portal;

pub use config::{DateRange, DateWindow, ScraperConfig};
pub use connectivity::{ConnectivityProbe, HttpProbe, StaticProbe};
pub use error::{ConfigError, ExportError, ScrapeError};
pub use export::{
    clean_output_path, default_output_path, load_export_rows, load_raw_records, sink_for,
    CsvSink, ExportRow, JsonSink, RecordSink,
};
pub use monitor::{ResourceSampler, ResourceSnapshot, SamplerSummary};
pub use navigator::{NavState, Navigator, Page, PageCursor};
pub use normalize::{normalize_batch, normalize_record};
pub use notify::{Channel, LogNotifier, MemoryMetricsSink, MetricsSink, Notifier};
pub use record::{CleanRecord, PoliticalParty, ProjectCategory, RawRecord};
pub use scrape::{launch, run_scrape, ScrapeOutcome, Scraper};
pub use stats::RunStatistics;
pub use summary::{summarize, DatasetSummary};
pub use validation::{RecordValidation, ValidationReport, Validator};
