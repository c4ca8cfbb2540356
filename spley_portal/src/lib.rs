//! Browser session layer for the Peruvian Congress bill portal (SPLEY).
//!
//! Exposes the [`Browser`] seam that the page navigator drives, a WebDriver
//! implementation of it, and the portal's DOM locator tables.

mod browser;
mod client;
mod errors;
mod locator;
pub mod selectors;
mod user_agent;

pub use self::browser::Browser;
pub use self::client::{BrowserSettings, WebDriverBrowser};
pub use self::errors::Error;
pub use self::locator::{FallbackLocators, Locator};
pub use self::user_agent::get_user_agent;
