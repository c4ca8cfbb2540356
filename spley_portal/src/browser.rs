//! The browser seam driven by the page navigator.

use std::time::Duration;

use async_trait::async_trait;

use crate::locator::Locator;
use crate::Error;

/// Element-level control of one browser session.
///
/// All calls are sequential against a single page; the session is stateful
/// (each "next page" depends on the previous interaction), so implementations
/// are never shared between concurrent callers.
#[async_trait]
pub trait Browser: Send + Sync {
    /// Handle to a located element.
    type Element: Clone + Send + Sync;

    /// Navigates the session to `url`.
    async fn goto(&self, url: &str) -> Result<(), Error>;

    /// `document.readyState` of the current page.
    async fn ready_state(&self) -> Result<String, Error>;

    /// Waits at most `timeout` for an element matching `locator` to be present.
    async fn wait_for(&self, locator: Locator, timeout: Duration) -> Result<Self::Element, Error>;

    async fn scroll_into_view(&self, element: &Self::Element) -> Result<(), Error>;

    async fn click(&self, element: &Self::Element) -> Result<(), Error>;

    async fn clear(&self, element: &Self::Element) -> Result<(), Error>;

    async fn send_keys(&self, element: &Self::Element, text: &str) -> Result<(), Error>;

    async fn is_enabled(&self, element: &Self::Element) -> Result<bool, Error>;

    async fn attribute(&self, element: &Self::Element, name: &str)
        -> Result<Option<String>, Error>;

    /// Serialized HTML of the current DOM.
    async fn page_source(&self) -> Result<String, Error>;

    /// Ends the session and releases the browser process.
    async fn quit(&self) -> Result<(), Error>;
}
