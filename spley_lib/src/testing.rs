//! Scripted in-memory browser for navigator and scraper tests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use spley_portal::{selectors, Browser, Error, Locator};

#[derive(Debug, Default)]
struct FakeState {
    pages: Vec<String>,
    current: usize,
    missing: HashSet<Locator>,
    always_intercept: bool,
    click_fails: bool,
    intercepts_left: u32,
    intercept_next_page: bool,
    goto_failures_left: u32,
    aria_disabled: bool,
    broken_page: Option<usize>,
    goto_attempts: u32,
    click_attempts: u32,
    clicked: Vec<Locator>,
    typed: Vec<String>,
    quit: bool,
}

/// Browser double that serves canned result pages.
///
/// Clones share state, so a test can keep a handle after moving one into a
/// navigator or scraper.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeBrowser {
    state: Arc<Mutex<FakeState>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FakeElement {
    locator: Locator,
}

impl FakeBrowser {
    pub fn with_pages(pages: Vec<String>) -> Self {
        let browser = Self::default();
        browser.state.lock().unwrap().pages = pages;
        browser
    }

    /// `locator` never resolves.
    pub fn missing(self, locator: Locator) -> Self {
        self.state.lock().unwrap().missing.insert(locator);
        self
    }

    /// Every click reports "another element would receive the click".
    pub fn always_intercept(self) -> Self {
        self.state.lock().unwrap().always_intercept = true;
        self
    }

    /// Every click fails with a plain WebDriver error.
    pub fn click_fails(self) -> Self {
        self.state.lock().unwrap().click_fails = true;
        self
    }

    /// The next `n` clicks are intercepted.
    pub fn intercept_times(self, n: u32) -> Self {
        self.state.lock().unwrap().intercepts_left = n;
        self
    }

    /// Clicks on the next-page control are always intercepted.
    pub fn intercept_next_page(self) -> Self {
        self.state.lock().unwrap().intercept_next_page = true;
        self
    }

    /// The next `n` navigations time out.
    pub fn fail_goto(self, n: u32) -> Self {
        self.state.lock().unwrap().goto_failures_left = n;
        self
    }

    /// Signal the last page through `aria-disabled` instead of `disabled`.
    pub fn aria_disabled(self) -> Self {
        self.state.lock().unwrap().aria_disabled = true;
        self
    }

    /// Reading the DOM of page `index` (zero-based) fails.
    pub fn broken_page(self, index: usize) -> Self {
        self.state.lock().unwrap().broken_page = Some(index);
        self
    }

    pub fn goto_attempts(&self) -> u32 {
        self.state.lock().unwrap().goto_attempts
    }

    pub fn click_attempts(&self) -> u32 {
        self.state.lock().unwrap().click_attempts
    }

    pub fn clicked(&self) -> Vec<Locator> {
        self.state.lock().unwrap().clicked.clone()
    }

    pub fn typed(&self) -> Vec<String> {
        self.state.lock().unwrap().typed.clone()
    }

    /// Zero-based index of the page on screen.
    pub fn current_page(&self) -> usize {
        self.state.lock().unwrap().current
    }

    pub fn quit_called(&self) -> bool {
        self.state.lock().unwrap().quit
    }
}

fn is_next_button(locator: Locator) -> bool {
    selectors::NEXT_PAGE_BUTTON.candidates.contains(&locator)
}

#[async_trait]
impl Browser for FakeBrowser {
    type Element = FakeElement;

    async fn goto(&self, url: &str) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        state.goto_attempts += 1;
        if state.goto_failures_left > 0 {
            state.goto_failures_left -= 1;
            return Err(Error::Timeout(format!("loading {}", url)));
        }
        Ok(())
    }

    async fn ready_state(&self) -> Result<String, Error> {
        Ok("complete".to_string())
    }

    async fn wait_for(&self, locator: Locator, timeout: Duration) -> Result<FakeElement, Error> {
        let found = {
            let state = self.state.lock().unwrap();
            if state.missing.contains(&locator) {
                false
            } else if locator == selectors::RESULT_ROWS {
                state
                    .pages
                    .get(state.current)
                    .map_or(false, |html| html.contains("<tr"))
            } else {
                true
            }
        };
        if found {
            Ok(FakeElement { locator })
        } else {
            tokio::time::sleep(timeout).await;
            Err(Error::Timeout(format!("waiting for {}", locator)))
        }
    }

    async fn scroll_into_view(&self, _element: &FakeElement) -> Result<(), Error> {
        Ok(())
    }

    async fn click(&self, element: &FakeElement) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        state.click_attempts += 1;
        if state.click_fails {
            return Err(Error::WebDriver(format!("click on {} rejected", element.locator)));
        }
        let next = is_next_button(element.locator);
        if state.always_intercept || (next && state.intercept_next_page) {
            return Err(Error::ClickIntercepted(element.locator.to_string()));
        }
        if state.intercepts_left > 0 {
            state.intercepts_left -= 1;
            return Err(Error::ClickIntercepted(element.locator.to_string()));
        }
        if next {
            state.current += 1;
        }
        state.clicked.push(element.locator);
        Ok(())
    }

    async fn clear(&self, _element: &FakeElement) -> Result<(), Error> {
        Ok(())
    }

    async fn send_keys(&self, _element: &FakeElement, text: &str) -> Result<(), Error> {
        self.state.lock().unwrap().typed.push(text.to_string());
        Ok(())
    }

    async fn is_enabled(&self, element: &FakeElement) -> Result<bool, Error> {
        let state = self.state.lock().unwrap();
        if is_next_button(element.locator) && !state.aria_disabled {
            return Ok(state.current + 1 < state.pages.len());
        }
        Ok(true)
    }

    async fn attribute(&self, element: &FakeElement, name: &str) -> Result<Option<String>, Error> {
        let state = self.state.lock().unwrap();
        if name == "aria-disabled" && is_next_button(element.locator) && state.aria_disabled {
            let last = state.current + 1 >= state.pages.len();
            return Ok(Some(last.to_string()));
        }
        Ok(None)
    }

    async fn page_source(&self) -> Result<String, Error> {
        let state = self.state.lock().unwrap();
        if state.broken_page == Some(state.current) {
            return Err(Error::WebDriver("page source unavailable".to_string()));
        }
        Ok(state.pages.get(state.current).cloned().unwrap_or_default())
    }

    async fn quit(&self) -> Result<(), Error> {
        self.state.lock().unwrap().quit = true;
        Ok(())
    }
}

/// A result page with `rows` well-formed bills numbered after `page`.
pub(crate) fn results_page(page: u32, rows: u32) -> String {
    let body: String = (1..=rows)
        .map(|i| {
            format!(
                r#"<tr><td>Proyecto de Ley {page}{i:03}/2024-CR</td><td>Fecha de Presentación15/06/2024</td>
                <td><span class="ellipsis">Ley que fortalece la educación rural {page}-{i}</span></td>
                <td>PRESENTADO</td><td>CONGRESO</td><td><ul><li>Ana Soto - PERU LIBRE</li></ul></td></tr>"#
            )
        })
        .collect();
    format!(
        r#"<html><body><table><tbody class="p-datatable-tbody">{}</tbody></table></body></html>"#,
        body
    )
}
