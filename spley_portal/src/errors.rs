//! Error types for the browser session layer.

/// Errors that can occur while driving the portal through a browser session.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Another element would have received the click (overlay, animation).
    #[error("element click intercepted: {0}")]
    ClickIntercepted(String),
    /// The element was detached from the DOM after it was located.
    #[error("stale element reference: {0}")]
    StaleElement(String),
    /// No element matched the locator.
    #[error("no such element: {0}")]
    NoSuchElement(String),
    /// A bounded wait (element, page load, script) ran out.
    #[error("timed out: {0}")]
    Timeout(String),
    /// Any other WebDriver command failure.
    #[error("webdriver error: {0}")]
    WebDriver(String),
    /// The session could not be created or was lost.
    #[error("browser session error: {0}")]
    Session(String),
}

impl Error {
    /// Click failures worth another attempt: the element was briefly obscured
    /// or the DOM re-rendered underneath us.
    pub fn is_click_retryable(&self) -> bool {
        matches!(self, Error::ClickIntercepted(_) | Error::StaleElement(_))
    }

    /// Navigation failures worth another attempt.
    pub fn is_navigation_retryable(&self) -> bool {
        matches!(self, Error::Timeout(_) | Error::WebDriver(_))
    }

    /// True when the failure only means "not there (yet)".
    pub fn is_missing(&self) -> bool {
        matches!(self, Error::NoSuchElement(_) | Error::Timeout(_))
    }
}

impl From<fantoccini::error::CmdError> for Error {
    fn from(err: fantoccini::error::CmdError) -> Self {
        use fantoccini::error::{CmdError, ErrorStatus};

        match &err {
            CmdError::Standard(wd) => match wd.error {
                ErrorStatus::ElementClickIntercepted => Error::ClickIntercepted(err.to_string()),
                ErrorStatus::StaleElementReference => Error::StaleElement(err.to_string()),
                ErrorStatus::NoSuchElement => Error::NoSuchElement(err.to_string()),
                ErrorStatus::Timeout | ErrorStatus::ScriptTimeout => {
                    Error::Timeout(err.to_string())
                }
                _ => Error::WebDriver(err.to_string()),
            },
            CmdError::WaitTimeout => Error::Timeout(err.to_string()),
            CmdError::Lost(_) => Error::Session(err.to_string()),
            _ => Error::WebDriver(err.to_string()),
        }
    }
}

impl From<fantoccini::error::NewSessionError> for Error {
    fn from(err: fantoccini::error::NewSessionError) -> Self {
        Error::Session(err.to_string())
    }
}
