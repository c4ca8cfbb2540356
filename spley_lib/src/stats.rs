//! Counters for one scraping run.

use chrono::{DateTime, Local};
use serde::Serialize;

/// Mutable while a run is in progress, copied out when it ends.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStatistics {
    pub pages_scraped: u32,
    /// Records that passed validation.
    pub projects_found: usize,
    pub errors_encountered: u32,
    pub retries_performed: u32,
    pub start_time: Option<DateTime<Local>>,
    pub end_time: Option<DateTime<Local>>,
}

impl RunStatistics {
    pub(crate) fn start(&mut self) {
        *self = RunStatistics {
            start_time: Some(Local::now()),
            ..RunStatistics::default()
        };
    }

    pub(crate) fn finish(&mut self) {
        self.end_time = Some(Local::now());
    }

    /// Wall-clock seconds between start and end, once both are known.
    pub fn duration_secs(&self) -> Option<f64> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => {
                Some((end - start).num_milliseconds().max(0) as f64 / 1000.0)
            }
            _ => None,
        }
    }

    /// Rows accepted per page visited.
    pub fn projects_per_page(&self) -> f64 {
        if self.pages_scraped == 0 {
            0.0
        } else {
            self.projects_found as f64 / f64::from(self.pages_scraped)
        }
    }

    /// One-line summary for logs and notifications.
    pub fn summary_line(&self) -> String {
        let duration = self
            .duration_secs()
            .map(|s| format!("{:.1}s", s))
            .unwrap_or_else(|| "n/a".to_string());
        format!(
            "pages: {}, projects: {}, errors: {}, retries: {}, duration: {}",
            self.pages_scraped,
            self.projects_found,
            self.errors_encountered,
            self.retries_performed,
            duration
        )
    }
}
