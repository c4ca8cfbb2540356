//! Page navigator: drives one search session through the portal.
//!
//! The session moves forward only:
//! `NotLoaded -> Loaded -> FiltersOpen -> DatesSet -> SearchExecuted ->
//! PageReady(1) -> PageReady(2) -> ... -> Done`. Every step resolves its
//! element through an ordered list of fallback locators and retries
//! transient browser failures.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use spley_portal::{selectors, Browser, FallbackLocators};
use tokio::time::{sleep, Instant};

use crate::config::{DateRange, ScraperConfig};
use crate::error::ScrapeError;
use crate::extract::extract_rows;
use crate::record::RawRecord;
use crate::retry::{retry, RetryPolicy};

const READY_POLL_INTERVAL: Duration = Duration::from_millis(500);
const SCROLL_SETTLE: Duration = Duration::from_millis(500);
const INPUT_SETTLE: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    NotLoaded,
    Loaded,
    FiltersOpen,
    DatesSet,
    SearchExecuted,
    /// Results of page `n` (1-based) are on screen.
    PageReady(u32),
    Done,
}

pub struct Navigator<B: Browser> {
    browser: B,
    config: Arc<ScraperConfig>,
    state: NavState,
    page: u32,
    retries: u32,
}

impl<B: Browser> Navigator<B> {
    pub fn new(browser: B, config: Arc<ScraperConfig>) -> Self {
        Self {
            browser,
            config,
            state: NavState::NotLoaded,
            page: 0,
            retries: 0,
        }
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    /// Current result page, 0 before the search ran.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Retries spent so far across every step.
    pub fn retries_performed(&self) -> u32 {
        self.retries
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Opens the search page and waits for it to finish loading.
    pub async fn load(&mut self) -> Result<(), ScrapeError> {
        let url = self.config.base_url.clone();
        tracing::info!("Loading {}", url);
        let policy = RetryPolicy::linear(self.config.max_retries, self.config.retry_delay);
        let browser = &self.browser;
        let (result, retries) = retry(
            &policy,
            "navigate",
            spley_portal::Error::is_navigation_retryable,
            || browser.goto(&url),
        )
        .await;
        self.retries += retries;
        if let Err(err) = result {
            tracing::error!("Could not load {}: {}", url, err);
            return Err(ScrapeError::Step { step: "load page" });
        }

        self.wait_for_ready().await;
        sleep(self.config.settle_delay).await;
        self.state = NavState::Loaded;
        Ok(())
    }

    /// Reveals the advanced filter panel.
    pub async fn open_filters(&mut self) -> Result<(), ScrapeError> {
        if !self.click_first(selectors::FILTERS_BUTTON).await {
            tracing::error!("Could not open the filter panel");
            return Err(ScrapeError::Step {
                step: "open filters",
            });
        }
        sleep(self.config.settle_delay).await;
        self.state = NavState::FiltersOpen;
        Ok(())
    }

    /// Types both bounds of `range` into the filter panel.
    pub async fn set_date_range(&mut self, range: &DateRange) -> Result<(), ScrapeError> {
        let from = range.from_text();
        let to = range.to_text();
        if !self.type_first(selectors::DATE_FROM_INPUT, &from).await {
            tracing::error!("Could not set the start date");
            return Err(ScrapeError::Step {
                step: "set date from",
            });
        }
        if !self.type_first(selectors::DATE_TO_INPUT, &to).await {
            tracing::error!("Could not set the end date");
            return Err(ScrapeError::Step { step: "set date to" });
        }
        tracing::info!("Date range set: {} - {}", from, to);
        sleep(self.config.settle_delay).await;
        self.state = NavState::DatesSet;
        Ok(())
    }

    /// Submits the search; the first result page follows.
    pub async fn execute_search(&mut self) -> Result<(), ScrapeError> {
        if !self.click_first(selectors::SEARCH_BUTTON).await {
            tracing::error!("Could not run the search");
            return Err(ScrapeError::Step {
                step: "execute search",
            });
        }
        sleep(self.config.request_delay * 2).await;
        self.state = NavState::SearchExecuted;
        self.page = 1;
        Ok(())
    }

    /// HTML of the current result page, or `None` when no rows show up
    /// within the element timeout.
    pub async fn current_page_source(&mut self) -> Result<Option<String>, ScrapeError> {
        match self
            .browser
            .wait_for(selectors::RESULT_ROWS, self.config.element_timeout)
            .await
        {
            Ok(_) => {}
            Err(err) if err.is_missing() => {
                tracing::info!("No result rows on page {}", self.page);
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        }
        let html = self.browser.page_source().await?;
        self.state = NavState::PageReady(self.page);
        Ok(Some(html))
    }

    /// Whether an enabled "next page" control is on screen.
    pub async fn has_next_page(&mut self) -> bool {
        self.enabled_next_button().await.is_some()
    }

    /// Clicks "next page". A failure ends pagination; it is never fatal.
    pub async fn go_to_next_page(&mut self) -> bool {
        let Some(button) = self.enabled_next_button().await else {
            self.state = NavState::Done;
            return false;
        };
        if let Err(err) = self.safe_click(&button, "next page").await {
            tracing::warn!("Could not move past page {}: {}", self.page, err);
            self.state = NavState::Done;
            return false;
        }
        self.page += 1;
        sleep(self.config.request_delay).await;
        true
    }

    pub fn finish(&mut self) {
        self.state = NavState::Done;
    }

    /// Ends the browser session.
    pub async fn quit(&self) -> Result<(), ScrapeError> {
        self.browser.quit().await?;
        Ok(())
    }

    async fn wait_for_ready(&self) {
        let deadline = Instant::now() + self.config.page_load_timeout;
        loop {
            match self.browser.ready_state().await {
                Ok(state) if state == "complete" => return,
                Ok(_) => {}
                Err(err) => tracing::debug!("readyState check failed: {}", err),
            }
            if Instant::now() >= deadline {
                tracing::warn!(
                    "Page did not finish loading within {:.0}s, continuing",
                    self.config.page_load_timeout.as_secs_f64()
                );
                return;
            }
            sleep(READY_POLL_INTERVAL).await;
        }
    }

    async fn find_first(&self, list: FallbackLocators, timeout: Duration) -> Option<B::Element> {
        for locator in list.iter() {
            match self.browser.wait_for(*locator, timeout).await {
                Ok(element) => {
                    tracing::debug!("Resolved {} via {}", list.name, locator);
                    return Some(element);
                }
                Err(err) => tracing::debug!("{} not found via {}: {}", list.name, locator, err),
            }
        }
        None
    }

    // Resolves the element locator by locator and stops at the first one
    // that resolves and accepts the click.
    async fn click_first(&mut self, list: FallbackLocators) -> bool {
        for locator in list.iter() {
            let element = match self
                .browser
                .wait_for(*locator, self.config.element_timeout)
                .await
            {
                Ok(element) => element,
                Err(err) => {
                    tracing::debug!("{} not found via {}: {}", list.name, locator, err);
                    continue;
                }
            };
            match self.safe_click(&element, list.name).await {
                Ok(()) => {
                    tracing::info!("Clicked {}", list.name);
                    return true;
                }
                Err(err) => tracing::warn!("Click on {} via {} failed: {}", list.name, locator, err),
            }
        }
        false
    }

    async fn type_first(&mut self, list: FallbackLocators, text: &str) -> bool {
        for locator in list.iter() {
            let element = match self
                .browser
                .wait_for(*locator, self.config.element_timeout)
                .await
            {
                Ok(element) => element,
                Err(err) => {
                    tracing::debug!("{} not found via {}: {}", list.name, locator, err);
                    continue;
                }
            };
            match self.safe_input(&element, text, list.name).await {
                Ok(()) => return true,
                Err(err) => tracing::warn!("Typing into {} via {} failed: {}", list.name, locator, err),
            }
        }
        false
    }

    async fn safe_click(
        &mut self,
        element: &B::Element,
        label: &str,
    ) -> Result<(), spley_portal::Error> {
        let policy = RetryPolicy::fixed(self.config.max_retries, self.config.retry_delay);
        let browser = &self.browser;
        let (result, retries) = retry(
            &policy,
            &format!("click {}", label),
            spley_portal::Error::is_click_retryable,
            || async move {
                browser.scroll_into_view(element).await?;
                sleep(SCROLL_SETTLE).await;
                browser.click(element).await
            },
        )
        .await;
        self.retries += retries;
        result
    }

    async fn safe_input(
        &mut self,
        element: &B::Element,
        text: &str,
        label: &str,
    ) -> Result<(), spley_portal::Error> {
        let policy = RetryPolicy::fixed(self.config.max_retries, self.config.retry_delay);
        let browser = &self.browser;
        let (result, retries) = retry(
            &policy,
            &format!("type into {}", label),
            spley_portal::Error::is_click_retryable,
            || async move {
                browser.clear(element).await?;
                sleep(INPUT_SETTLE).await;
                browser.send_keys(element, text).await?;
                sleep(INPUT_SETTLE).await;
                Ok(())
            },
        )
        .await;
        self.retries += retries;
        result
    }

    async fn enabled_next_button(&self) -> Option<B::Element> {
        let button = self
            .find_first(selectors::NEXT_PAGE_BUTTON, self.config.next_page_timeout)
            .await?;
        let enabled = self.browser.is_enabled(&button).await.unwrap_or(false);
        if !enabled {
            return None;
        }
        let aria = self
            .browser
            .attribute(&button, "aria-disabled")
            .await
            .ok()
            .flatten();
        if aria.as_deref() == Some("true") {
            return None;
        }
        let class = self
            .browser
            .attribute(&button, "class")
            .await
            .ok()
            .flatten()
            .unwrap_or_default();
        if class.split_whitespace().any(|c| c == "p-disabled") {
            return None;
        }
        Some(button)
    }
}

/// One result page worth of rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub number: u32,
    pub records: Vec<RawRecord>,
}

/// Sequential walk over result pages.
///
/// Each call to [`PageCursor::next`] moves the session forward one page, so
/// dropping the cursor early is the way to stop.
pub struct PageCursor<'a, B: Browser> {
    nav: &'a mut Navigator<B>,
    max_pages: u32,
    yielded: u32,
    finished: bool,
}

impl<'a, B: Browser> PageCursor<'a, B> {
    /// Starts at the first page of an executed search.
    pub fn new(nav: &'a mut Navigator<B>) -> Self {
        let max_pages = nav.config.max_pages;
        Self {
            nav,
            max_pages,
            yielded: 0,
            finished: false,
        }
    }

    /// The next page, `None` once pagination is over. An `Err` ends the walk.
    pub async fn next(&mut self) -> Option<Result<Page, ScrapeError>> {
        if self.finished {
            return None;
        }
        if self.yielded > 0 && !self.advance().await {
            return self.stop();
        }

        let number = self.nav.page;
        match self.nav.current_page_source().await {
            Ok(Some(html)) => {
                let records = extract_rows(&html);
                if records.is_empty() {
                    tracing::info!("Page {} has no rows, stopping", number);
                    return self.stop();
                }
                self.yielded += 1;
                Some(Ok(Page { number, records }))
            }
            Ok(None) => self.stop(),
            Err(err) => {
                self.stop();
                Some(Err(err))
            }
        }
    }

    async fn advance(&mut self) -> bool {
        if self.yielded >= self.max_pages {
            tracing::info!("Reached page limit ({})", self.max_pages);
            return false;
        }
        if !self.nav.has_next_page().await {
            tracing::info!("No more pages after page {}", self.nav.page);
            return false;
        }
        if !self.nav.go_to_next_page().await {
            return false;
        }
        sleep(inter_page_delay(self.nav.config())).await;
        true
    }

    fn stop(&mut self) -> Option<Result<Page, ScrapeError>> {
        self.finished = true;
        self.nav.finish();
        None
    }
}

/// Base request delay plus a random jitter.
fn inter_page_delay(config: &ScraperConfig) -> Duration {
    let min = config.jitter_min.as_secs_f64();
    let max = config.jitter_max.as_secs_f64();
    let jitter = if max > min {
        rand::thread_rng().gen_range(min..=max)
    } else {
        min
    };
    config.request_delay + Duration::from_secs_f64(jitter)
}
