//! Reachability check run before a browser session touches the portal.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::ScraperConfig;

#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    /// True when the outside world answers.
    async fn is_online(&self) -> bool;
}

/// GETs a known-stable URL and treats any 2xx answer as "online".
pub struct HttpProbe {
    url: String,
    http: reqwest::Client,
}

impl HttpProbe {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.into(),
            http,
        })
    }

    pub fn from_config(config: &ScraperConfig) -> Result<Self, reqwest::Error> {
        Self::new(config.connectivity_url.clone(), config.connectivity_timeout)
    }
}

#[async_trait]
impl ConnectivityProbe for HttpProbe {
    async fn is_online(&self) -> bool {
        match self.http.get(&self.url).send().await {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                tracing::warn!("Connectivity check got status {}", resp.status());
                false
            }
            Err(err) => {
                tracing::warn!("Connectivity check failed: {}", err);
                false
            }
        }
    }
}

/// Probe with a fixed answer, for offline runs and tests.
pub struct StaticProbe(pub bool);

#[async_trait]
impl ConnectivityProbe for StaticProbe {
    async fn is_online(&self) -> bool {
        self.0
    }
}
