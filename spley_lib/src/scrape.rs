//! Extraction orchestrator: one scraping run from search to validated records.

use std::sync::Arc;

use spley_portal::{Browser, WebDriverBrowser};

use crate::config::{DateRange, ScraperConfig};
use crate::connectivity::{ConnectivityProbe, HttpProbe};
use crate::error::ScrapeError;
use crate::navigator::{Navigator, PageCursor};
use crate::notify::{Channel, MetricsSink, Notifier};
use crate::record::{CleanRecord, RawRecord};
use crate::stats::RunStatistics;
use crate::validation::{ValidationReport, Validator};

/// Runs searches against the portal through one browser session.
///
/// The session is held for the scraper's whole life. Call
/// [`Scraper::close`] when done, or use [`run_scrape`], which always does.
pub struct Scraper<B: Browser> {
    navigator: Navigator<B>,
    config: Arc<ScraperConfig>,
    validator: Option<Validator>,
    probe: Option<Box<dyn ConnectivityProbe>>,
    notifier: Option<(Arc<dyn Notifier>, Channel)>,
    metrics: Option<Arc<dyn MetricsSink>>,
    stats: RunStatistics,
    report: Option<ValidationReport>,
}

impl<B: Browser> Scraper<B> {
    pub fn new(browser: B, config: Arc<ScraperConfig>) -> Self {
        Self {
            navigator: Navigator::new(browser, Arc::clone(&config)),
            config,
            validator: None,
            probe: None,
            notifier: None,
            metrics: None,
            stats: RunStatistics::default(),
            report: None,
        }
    }

    /// Replaces the default HTTP connectivity check.
    pub fn with_probe(mut self, probe: Box<dyn ConnectivityProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>, channel: Channel) -> Self {
        self.notifier = Some((notifier, channel));
        self
    }

    pub fn with_metrics_sink(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.metrics = Some(sink);
        self
    }

    /// Validates against a fixed validator instead of one dated today.
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Scrapes every bill presented within `range`.
    ///
    /// Never fails: a run that breaks returns what it gathered (often
    /// nothing) and the reason shows up in [`Scraper::statistics`].
    pub async fn scrape(&mut self, range: DateRange) -> Vec<CleanRecord> {
        self.stats.start();
        self.report = None;
        let retries_before = self.navigator.retries_performed();
        tracing::info!(
            "Starting scrape for {} - {}",
            range.from_text(),
            range.to_text()
        );
        self.notify(
            "Scraping iniciado",
            &format!("Rango: {} - {}", range.from_text(), range.to_text()),
        );

        let outcome = self.run(&range).await;
        self.stats.retries_performed = self.navigator.retries_performed() - retries_before;

        let records = match outcome {
            Ok(records) => records,
            Err(err) => {
                tracing::error!("Scrape aborted: {}", err);
                self.stats.errors_encountered += 1;
                self.notify("Error en scraping", &err.to_string());
                Vec::new()
            }
        };
        self.stats.projects_found = records.len();
        self.stats.finish();
        tracing::info!("Scrape finished ({})", self.stats.summary_line());

        if let Some(sink) = &self.metrics {
            sink.record_run(&self.stats, self.report.as_ref());
        }
        if self.stats.errors_encountered == 0 {
            self.notify("Scraping completado", &self.stats.summary_line());
        }
        records
    }

    async fn run(&mut self, range: &DateRange) -> Result<Vec<CleanRecord>, ScrapeError> {
        if !self.check_connectivity().await? {
            return Err(ScrapeError::Offline);
        }

        self.navigator.load().await?;
        self.navigator.open_filters().await?;
        self.navigator.set_date_range(range).await?;
        self.navigator.execute_search().await?;

        let raw = self.collect_pages().await;
        tracing::info!("Collected {} rows from {} pages", raw.len(), self.stats.pages_scraped);

        let validator = self.validator.unwrap_or_default();
        let (valid, report) = validator.validate_batch(&raw);
        tracing::debug!("{}", report.summary_text());
        self.report = Some(report);
        Ok(valid)
    }

    async fn check_connectivity(&self) -> Result<bool, ScrapeError> {
        let online = match &self.probe {
            Some(probe) => probe.is_online().await,
            None => HttpProbe::from_config(&self.config)?.is_online().await,
        };
        if !online {
            tracing::error!("No internet connection, not opening the portal");
        }
        Ok(online)
    }

    // Per-page failures end pagination but keep what was gathered.
    async fn collect_pages(&mut self) -> Vec<RawRecord> {
        let mut raw = Vec::new();
        let mut cursor = PageCursor::new(&mut self.navigator);
        while let Some(page) = cursor.next().await {
            match page {
                Ok(page) => {
                    self.stats.pages_scraped += 1;
                    tracing::info!("Page {}: {} rows", page.number, page.records.len());
                    raw.extend(page.records);
                }
                Err(err) => {
                    tracing::error!("Stopping pagination: {}", err);
                    self.stats.errors_encountered += 1;
                    break;
                }
            }
        }
        raw
    }

    fn notify(&self, subject: &str, body: &str) {
        if let Some((notifier, channel)) = &self.notifier {
            let results = notifier.send(subject, body, channel);
            for (name, ok) in results {
                if !ok {
                    tracing::warn!("Notification via {} failed", name);
                }
            }
        }
    }

    /// Counters of the last run.
    pub fn statistics(&self) -> RunStatistics {
        self.stats.clone()
    }

    /// Validation report of the last run, if it got as far as validating.
    pub fn validation_report(&self) -> Option<&ValidationReport> {
        self.report.as_ref()
    }

    /// Releases the browser session.
    pub async fn close(&self) -> Result<(), ScrapeError> {
        self.navigator.quit().await
    }
}

/// Opens a WebDriver session for a new scraper.
pub async fn launch(config: Arc<ScraperConfig>) -> Result<Scraper<WebDriverBrowser>, ScrapeError> {
    let browser = WebDriverBrowser::connect(&config.browser).await?;
    Ok(Scraper::new(browser, config))
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct ScrapeOutcome {
    pub records: Vec<CleanRecord>,
    pub stats: RunStatistics,
    pub report: Option<ValidationReport>,
}

/// Scrapes `range` and closes the session whatever happened.
pub async fn run_scrape<B: Browser>(scraper: Scraper<B>, range: DateRange) -> ScrapeOutcome {
    let mut scraper = scraper;
    let records = scraper.scrape(range).await;
    if let Err(err) = scraper.close().await {
        tracing::warn!("Could not close browser session: {}", err);
    }
    ScrapeOutcome {
        records,
        stats: scraper.statistics(),
        report: scraper.validation_report().cloned(),
    }
}
