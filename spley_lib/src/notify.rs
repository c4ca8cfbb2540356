//! Optional collaborators the scraper reports to.
//!
//! Both are injected; a scraper without them works the same, it just tells
//! nobody.

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde::Serialize;

use crate::stats::RunStatistics;
use crate::validation::ValidationReport;

/// Which delivery channels a notification goes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Channel {
    All,
    Only(Vec<String>),
}

impl Channel {
    pub fn includes(&self, name: &str) -> bool {
        match self {
            Channel::All => true,
            Channel::Only(names) => names.iter().any(|n| n.eq_ignore_ascii_case(name)),
        }
    }
}

pub trait Notifier: Send + Sync {
    /// Delivers `subject`/`body`; returns success per channel attempted.
    fn send(&self, subject: &str, body: &str, channel: &Channel) -> BTreeMap<String, bool>;
}

/// Writes notifications to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl LogNotifier {
    pub const CHANNEL: &'static str = "log";
}

impl Notifier for LogNotifier {
    fn send(&self, subject: &str, body: &str, channel: &Channel) -> BTreeMap<String, bool> {
        let mut results = BTreeMap::new();
        if channel.includes(Self::CHANNEL) {
            tracing::info!("[notification] {}: {}", subject, body);
            results.insert(Self::CHANNEL.to_string(), true);
        }
        results
    }
}

pub trait MetricsSink: Send + Sync {
    fn record_run(&self, stats: &RunStatistics, report: Option<&ValidationReport>);
}

/// One run as seen by a metrics sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedRun {
    pub stats: RunStatistics,
    pub report: Option<ValidationReport>,
}

/// Keeps every recorded run in memory.
#[derive(Debug, Default)]
pub struct MemoryMetricsSink {
    runs: Mutex<Vec<RecordedRun>>,
}

impl MemoryMetricsSink {
    pub fn runs(&self) -> Vec<RecordedRun> {
        self.runs.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl MetricsSink for MemoryMetricsSink {
    fn record_run(&self, stats: &RunStatistics, report: Option<&ValidationReport>) {
        self.runs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedRun {
                stats: stats.clone(),
                report: report.cloned(),
            });
    }
}
