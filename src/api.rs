use std::{future::Future, time::Duration};

use log::{debug, warn};
use reqwest::{IntoUrl, StatusCode};
use tokio::time::sleep;

use crate::config::Config;

/// Response of a plain GET. Non-success statuses are not errors at this level.
#[derive(Clone, Debug)]
pub struct Fetched {
    pub status: StatusCode,
    pub body: String,
}

/// Where index responses and result pages come from.
pub trait PageSource {
    /// `None` when the request never got a response.
    fn get_page(&self, url: &str) -> impl Future<Output = Option<Fetched>>;
}

pub struct RacingPostClient {
    reqwest: reqwest::Client,
    interval: Duration,
}

impl RacingPostClient {
    pub fn new(config: &Config) -> reqwest::Result<Self> {
        let reqwest = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .connection_verbose(true)
            .build()?;
        Ok(Self {
            reqwest,
            interval: config.request_interval,
        })
    }

    /// Sends one GET and waits for the configured interval afterwards.
    pub async fn get(&self, url: impl IntoUrl) -> reqwest::Result<Fetched> {
        let url = url.into_url()?;
        debug!("GET {url}");
        let response = self.reqwest.get(url).send().await;
        if !self.interval.is_zero() {
            sleep(self.interval).await;
        }
        let response = response?;
        let status = response.status();
        let body = response.text().await?;
        debug!("  {status}, {} bytes", body.len());
        Ok(Fetched { status, body })
    }
}

impl PageSource for RacingPostClient {
    async fn get_page(&self, url: &str) -> Option<Fetched> {
        match self.get(url).await {
            Ok(fetched) => Some(fetched),
            Err(e) => {
                warn!("Request to {url} failed: {e}");
                None
            }
        }
    }
}
