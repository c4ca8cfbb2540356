//! Error types for the library layer.

/// Why a scraping run stopped before producing records.
///
/// Never escapes [`crate::Scraper::scrape`]; it is logged, counted and turned
/// into an empty (or partial) result there.
#[derive(thiserror::Error, Debug)]
pub enum ScrapeError {
    #[error("browser error: {0}")]
    Browser(#[from] spley_portal::Error),
    #[error("no internet connection")]
    Offline,
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
    /// A navigator step ran out of retries and fallback locators.
    #[error("step '{step}' failed after retries")]
    Step { step: &'static str },
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Failures writing or reading record exports.
#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no records to export")]
    Empty,
}

/// An environment value that could not be used.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: String, value: String },
    #[error("{key} must be greater than zero")]
    Zero { key: String },
    #[error("date range starts after it ends ({from} > {to})")]
    InvertedRange { from: String, to: String },
}
