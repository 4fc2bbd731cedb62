//! The two ways of turning a URL into a queryable page.
//!
//! `RenderedFetcher` drives a real browser and waits for the detail-page
//! marker before snapshotting the DOM; `StaticFetcher` issues a plain GET
//! and hands the body over as-is. Both produce a [`PageDocument`], so the
//! extractor never knows which path a page took.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use scraper::Html;
use thirtyfour::prelude::*;

use crate::error::{Result, ScrapeError};

const UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const DEFAULT_MARKER_TIMEOUT: Duration = Duration::from_secs(10);

/// An immutable snapshot of a loaded page plus the URL it came from.
///
/// Snapshotting (rather than handing out live element handles) keeps the
/// document valid after the browser navigates elsewhere.
#[derive(Debug, Clone)]
pub struct PageDocument {
    pub url: String,
    html: String,
}

impl PageDocument {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }

    pub fn parse(&self) -> Html {
        Html::parse_document(&self.html)
    }
}

/// Loads a URL and hands back a queryable document.
#[async_trait]
pub trait FetchStrategy: Send + Sync {
    async fn load(&self, url: &str) -> Result<PageDocument>;
}

/// Drives a live browser session. Navigation replaces whatever page the
/// session was on, so the session must not be shared with anything that
/// still cares about the previous page.
pub struct RenderedFetcher {
    driver: WebDriver,
    marker: String,
    marker_timeout: Duration,
}

impl RenderedFetcher {
    pub fn new(driver: WebDriver, marker: impl Into<String>) -> Self {
        Self {
            driver,
            marker: marker.into(),
            marker_timeout: DEFAULT_MARKER_TIMEOUT,
        }
    }

    pub fn with_marker_timeout(mut self, timeout: Duration) -> Self {
        self.marker_timeout = timeout;
        self
    }
}

#[async_trait]
impl FetchStrategy for RenderedFetcher {
    async fn load(&self, url: &str) -> Result<PageDocument> {
        self.driver.goto(url).await?;
        self.driver
            .query(By::Css(self.marker.clone()))
            .wait(self.marker_timeout, Duration::from_millis(500))
            .first()
            .await
            .map_err(|_| ScrapeError::LoadTimeout(url.to_string()))?;
        let html = self.driver.source().await?;
        Ok(PageDocument::new(url, html))
    }
}

/// Plain HTTP GET plus an in-memory parse; stateless, one page per call.
pub struct StaticFetcher {
    client: reqwest::Client,
}

impl StaticFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FetchStrategy for StaticFetcher {
    async fn load(&self, url: &str) -> Result<PageDocument> {
        let response = self.client.get(url).header(USER_AGENT, UA).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let html = response.text().await?;
        Ok(PageDocument::new(url, html))
    }
}
