//! Run configuration, built once at startup and never mutated afterwards.

use std::time::Duration;

use chrono::{Days, Local, NaiveDate};
use serde::{Serialize, Serializer};
use spley_portal::{selectors, BrowserSettings};

use crate::error::ConfigError;
use crate::normalize::DATE_FORMAT;

/// Which dates fill in bounds the caller left open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateWindow {
    /// Both bounds default to today.
    #[default]
    Today,
    /// `to` is today, `from` is `n` days earlier.
    LastDays(u32),
}

/// Inclusive presentation-date range for one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, ConfigError> {
        if from > to {
            return Err(ConfigError::InvertedRange {
                from: from.format(DATE_FORMAT).to_string(),
                to: to.format(DATE_FORMAT).to_string(),
            });
        }
        Ok(Self { from, to })
    }

    /// A single-day range for today.
    pub fn today() -> Self {
        let today = Local::now().date_naive();
        Self {
            from: today,
            to: today,
        }
    }

    /// Fills open bounds from `window`, relative to the local date.
    pub fn resolve(
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        window: DateWindow,
    ) -> Result<Self, ConfigError> {
        Self::resolve_on(from, to, window, Local::now().date_naive())
    }

    pub fn resolve_on(
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        window: DateWindow,
        today: NaiveDate,
    ) -> Result<Self, ConfigError> {
        let from = match (from, window) {
            (Some(from), _) => from,
            (None, DateWindow::Today) => today,
            (None, DateWindow::LastDays(n)) => today
                .checked_sub_days(Days::new(u64::from(n)))
                .ok_or_else(|| ConfigError::Invalid {
                    key: "last_days".to_string(),
                    value: n.to_string(),
                })?,
        };
        Self::new(from, to.unwrap_or(today))
    }

    /// `from` as typed into the portal.
    pub fn from_text(&self) -> String {
        self.from.format(DATE_FORMAT).to_string()
    }

    /// `to` as typed into the portal.
    pub fn to_text(&self) -> String {
        self.to.format(DATE_FORMAT).to_string()
    }
}

/// Everything the navigator, orchestrator and probe need to know.
///
/// Wrap it in an `Arc` after overrides are applied and pass it around by
/// reference; nothing reads configuration from the environment after that.
#[derive(Debug, Clone, Serialize)]
pub struct ScraperConfig {
    pub base_url: String,
    pub connectivity_url: String,
    #[serde(serialize_with = "as_secs")]
    pub connectivity_timeout: Duration,
    /// Upper bound on result pages visited per run.
    pub max_pages: u32,
    /// Attempts per navigator step, first try included.
    pub max_retries: u32,
    #[serde(serialize_with = "as_secs")]
    pub retry_delay: Duration,
    /// Bounded wait for an element to appear.
    #[serde(serialize_with = "as_secs")]
    pub element_timeout: Duration,
    #[serde(serialize_with = "as_secs")]
    pub page_load_timeout: Duration,
    /// Short wait for the next-page control, which is often simply absent.
    #[serde(serialize_with = "as_secs")]
    pub next_page_timeout: Duration,
    #[serde(serialize_with = "as_secs")]
    pub request_delay: Duration,
    /// Pause after filters and dates are applied.
    #[serde(serialize_with = "as_secs")]
    pub settle_delay: Duration,
    #[serde(serialize_with = "as_secs")]
    pub jitter_min: Duration,
    #[serde(serialize_with = "as_secs")]
    pub jitter_max: Duration,
    pub date_window: DateWindow,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
    pub browser: BrowserSettings,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: selectors::BASE_URL.to_string(),
            connectivity_url: "https://www.google.com".to_string(),
            connectivity_timeout: Duration::from_secs(5),
            max_pages: 50,
            max_retries: 3,
            retry_delay: Duration::from_secs(2),
            element_timeout: Duration::from_secs(15),
            page_load_timeout: Duration::from_secs(30),
            next_page_timeout: Duration::from_secs(2),
            request_delay: Duration::from_secs(1),
            settle_delay: Duration::from_secs(2),
            jitter_min: Duration::from_millis(500),
            jitter_max: Duration::from_millis(1500),
            date_window: DateWindow::Today,
            output_dir: None,
            browser: BrowserSettings::default(),
        }
    }
}

impl ScraperConfig {
    /// Defaults overlaid with `SPLEY_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ScraperConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(url) = lookup("SPLEY_BASE_URL") {
            cfg.base_url = url;
        }
        if let Some(url) = lookup("SPLEY_CONNECTIVITY_URL") {
            cfg.connectivity_url = url;
        }
        cfg.connectivity_timeout =
            env_secs(&lookup, "SPLEY_CONNECTIVITY_TIMEOUT_SECS", cfg.connectivity_timeout)?;
        cfg.max_pages = env_u32(&lookup, "SPLEY_MAX_PAGES", cfg.max_pages)?;
        cfg.max_retries = env_u32(&lookup, "SPLEY_MAX_RETRIES", cfg.max_retries)?;
        cfg.retry_delay = env_secs(&lookup, "SPLEY_RETRY_DELAY_SECS", cfg.retry_delay)?;
        cfg.element_timeout =
            env_secs(&lookup, "SPLEY_ELEMENT_TIMEOUT_SECS", cfg.element_timeout)?;
        cfg.page_load_timeout =
            env_secs(&lookup, "SPLEY_PAGE_LOAD_TIMEOUT_SECS", cfg.page_load_timeout)?;
        cfg.request_delay = env_secs(&lookup, "SPLEY_REQUEST_DELAY_SECS", cfg.request_delay)?;
        if let Some(days) = lookup("SPLEY_LAST_DAYS") {
            let n = parse_value::<u32>("SPLEY_LAST_DAYS", &days)?;
            cfg.date_window = DateWindow::LastDays(n);
        }
        if let Some(dir) = lookup("SPLEY_OUTPUT_DIR") {
            cfg.output_dir = Some(dir);
        }

        if let Some(url) = lookup("SPLEY_WEBDRIVER_URL") {
            cfg.browser.webdriver_url = url;
        }
        cfg.browser.headless = env_bool(&lookup, "SPLEY_HEADLESS", cfg.browser.headless)?;
        if let Some(agent) = lookup("SPLEY_USER_AGENT") {
            cfg.browser.user_agent = Some(agent);
        }
        cfg.browser.page_load_timeout = cfg.page_load_timeout;

        cfg.check()?;
        Ok(cfg)
    }

    /// Rejects values the navigator cannot work with.
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.max_pages == 0 {
            return Err(ConfigError::Zero {
                key: "max_pages".to_string(),
            });
        }
        if self.max_retries == 0 {
            return Err(ConfigError::Zero {
                key: "max_retries".to_string(),
            });
        }
        Ok(())
    }
}

fn as_secs<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse::<T>().map_err(|_| ConfigError::Invalid {
        key: key.to_string(),
        value: raw.to_string(),
    })
}

fn env_u32<F>(lookup: &F, key: &str, default: u32) -> Result<u32, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(val) => parse_value(key, &val),
        None => Ok(default),
    }
}

fn env_secs<F>(lookup: &F, key: &str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(val) => {
            let secs: f64 = parse_value(key, &val)?;
            if !secs.is_finite() || secs < 0.0 {
                return Err(ConfigError::Invalid {
                    key: key.to_string(),
                    value: val,
                });
            }
            Ok(Duration::from_secs_f64(secs))
        }
        None => Ok(default),
    }
}

fn env_bool<F>(lookup: &F, key: &str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(val) => match val.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid {
                key: key.to_string(),
                value: val,
            }),
        },
        None => Ok(default),
    }
}
