//! WebDriver-backed browser session for the bill portal.

use std::time::Duration;

use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::wd::TimeoutConfiguration;
use fantoccini::{Client, ClientBuilder};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::{browser::Browser, locator::Locator, user_agent::get_user_agent, Error};

/// How to start the browser session.
#[derive(Debug, Clone, Serialize)]
pub struct BrowserSettings {
    /// Address of the running WebDriver server (chromedriver).
    pub webdriver_url: String,
    /// Run Chrome without a window.
    pub headless: bool,
    /// Extra Chrome command-line arguments.
    pub chrome_args: Vec<String>,
    /// Fixed user agent. A random desktop agent is used when `None`.
    pub user_agent: Option<String>,
    pub page_load_timeout: Duration,
    pub script_timeout: Duration,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            headless: true,
            chrome_args: [
                "--start-maximized",
                "--no-sandbox",
                "--disable-dev-shm-usage",
                "--disable-blink-features=AutomationControlled",
                "--disable-extensions",
                "--disable-plugins",
                "--disable-gpu",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            user_agent: None,
            page_load_timeout: Duration::from_secs(30),
            script_timeout: Duration::from_secs(30),
        }
    }
}

impl BrowserSettings {
    /// Chrome capabilities for the WebDriver new-session request.
    pub fn capabilities(&self) -> Map<String, Value> {
        let mut args = self.chrome_args.clone();
        if self.headless {
            args.push("--headless=new".to_string());
        }
        let agent = self
            .user_agent
            .clone()
            .unwrap_or_else(|| get_user_agent().to_string());
        args.push(format!("--user-agent={}", agent));

        let mut caps = Map::new();
        caps.insert("browserName".to_string(), json!("chrome"));
        caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
        caps
    }
}

/// A live WebDriver session.
///
/// The session holds a real browser process: call [`Browser::quit`] when done,
/// otherwise the process outlives the program.
pub struct WebDriverBrowser {
    client: Client,
}

impl WebDriverBrowser {
    /// Starts a new session against the configured WebDriver server.
    pub async fn connect(settings: &BrowserSettings) -> Result<Self, Error> {
        let client = ClientBuilder::native()
            .capabilities(settings.capabilities())
            .connect(&settings.webdriver_url)
            .await?;

        client
            .update_timeouts(TimeoutConfiguration::new(
                Some(settings.script_timeout),
                Some(settings.page_load_timeout),
                None,
            ))
            .await?;

        tracing::info!(
            "Browser session started (headless: {})",
            settings.headless
        );
        Ok(Self { client })
    }
}

#[async_trait]
impl Browser for WebDriverBrowser {
    type Element = Element;

    async fn goto(&self, url: &str) -> Result<(), Error> {
        Ok(self.client.goto(url).await?)
    }

    async fn ready_state(&self) -> Result<String, Error> {
        let state = self
            .client
            .execute("return document.readyState", vec![])
            .await?;
        Ok(state.as_str().unwrap_or_default().to_string())
    }

    async fn wait_for(&self, locator: Locator, timeout: Duration) -> Result<Element, Error> {
        Ok(self
            .client
            .wait()
            .at_most(timeout)
            .for_element(locator.to_fantoccini())
            .await?)
    }

    async fn scroll_into_view(&self, element: &Element) -> Result<(), Error> {
        let arg = serde_json::to_value(element).map_err(|e| Error::WebDriver(e.to_string()))?;
        self.client
            .execute("arguments[0].scrollIntoView(true);", vec![arg])
            .await?;
        Ok(())
    }

    async fn click(&self, element: &Element) -> Result<(), Error> {
        Ok(element.click().await?)
    }

    async fn clear(&self, element: &Element) -> Result<(), Error> {
        Ok(element.clear().await?)
    }

    async fn send_keys(&self, element: &Element, text: &str) -> Result<(), Error> {
        Ok(element.send_keys(text).await?)
    }

    async fn is_enabled(&self, element: &Element) -> Result<bool, Error> {
        Ok(element.is_enabled().await?)
    }

    async fn attribute(&self, element: &Element, name: &str) -> Result<Option<String>, Error> {
        Ok(element.attr(name).await?)
    }

    async fn page_source(&self) -> Result<String, Error> {
        Ok(self.client.source().await?)
    }

    async fn quit(&self) -> Result<(), Error> {
        self.client.clone().close().await?;
        tracing::info!("Browser session closed");
        Ok(())
    }
}
