//! Listing-page discovery: load the search results through the browser,
//! scroll until no new content appears, then pull every detail URL out of
//! the rendered DOM in document order.

use std::time::Duration;

use scraper::Html;
use thirtyfour::prelude::*;
use tracing::{info, warn};

use crate::error::{Result, ScrapeError};
use crate::selectors::CompiledSelectors;

const MARKER_TIMEOUT: Duration = Duration::from_secs(10);

pub struct Discoverer {
    driver: WebDriver,
    selectors: CompiledSelectors,
}

impl Discoverer {
    pub fn new(driver: WebDriver, selectors: CompiledSelectors) -> Self {
        Self { driver, selectors }
    }

    /// Collects detail-page URLs from the listing, truncated to `limit`
    /// when one is given (DOM order, first entries kept).
    ///
    /// Never propagates a session fault: if the window is closed or the
    /// driver dies mid-way, this logs the problem and returns whatever was
    /// collected, possibly nothing. The run then continues with an empty
    /// (or short) URL set.
    pub async fn discover(
        &self,
        listing_url: &str,
        limit: Option<usize>,
        scroll_settle: Duration,
    ) -> Vec<String> {
        match self.try_discover(listing_url, limit, scroll_settle).await {
            Ok(urls) => urls,
            Err(e) => {
                warn!(url = %listing_url, error = %e, "discovery aborted");
                Vec::new()
            }
        }
    }

    async fn try_discover(
        &self,
        listing_url: &str,
        limit: Option<usize>,
        scroll_settle: Duration,
    ) -> Result<Vec<String>> {
        self.driver.goto(listing_url).await?;

        // Listing content is injected by JavaScript; wait until at least
        // one entry exists before looking at the page at all.
        self.driver
            .query(By::Css(self.selectors.raw.listing_item.clone()))
            .wait(MARKER_TIMEOUT, Duration::from_millis(500))
            .first()
            .await
            .map_err(|_| ScrapeError::LoadTimeout(listing_url.to_string()))?;

        // A scroll fault should not throw away what already loaded; fall
        // through and snapshot whatever is there.
        if let Err(e) = self.scroll_to_bottom(scroll_settle).await {
            warn!(error = %e, "scrolling aborted, collecting what has loaded so far");
        }

        let html = self.driver.source().await?;
        let urls = collect_detail_urls(&html, &self.selectors, limit);
        info!("loaded {} detail urls", urls.len());
        Ok(urls)
    }

    /// Scroll-to-bottom until the page height stops growing. The settle
    /// pause gives infinite-scroll pages time to append content; callers
    /// pass zero when the listing has no dynamic loading.
    async fn scroll_to_bottom(&self, settle: Duration) -> Result<()> {
        info!("scrolling to bottom and loading new content");
        let mut last_height = self.page_height().await?;
        loop {
            self.driver
                .execute(
                    "window.scrollTo(0, document.body.scrollHeight);",
                    Vec::<serde_json::Value>::new(),
                )
                .await?;
            if !settle.is_zero() {
                tokio::time::sleep(settle).await;
            }
            let new_height = self.page_height().await?;
            if new_height == last_height {
                break;
            }
            last_height = new_height;
        }
        Ok(())
    }

    async fn page_height(&self) -> Result<u64> {
        let ret = self
            .driver
            .execute(
                "return document.body.scrollHeight",
                Vec::<serde_json::Value>::new(),
            )
            .await?;
        Ok(ret.convert()?)
    }
}

/// Pulls the href of every listing entry's anchor out of a page snapshot,
/// in DOM order, keeping at most `limit` entries.
pub fn collect_detail_urls(
    html: &str,
    selectors: &CompiledSelectors,
    limit: Option<usize>,
) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut urls = Vec::new();
    for item in document.select(&selectors.listing_item) {
        if limit.is_some_and(|limit| urls.len() >= limit) {
            info!("done getting the first {} urls", urls.len());
            break;
        }
        if let Some(href) = item
            .select(&selectors.listing_anchor)
            .next()
            .and_then(|a| a.value().attr("href"))
        {
            urls.push(href.to_string());
        }
    }
    urls
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selectors::SelectorSet;

    const LISTING: &str = r#"
        <html><body>
            <div class="Q9MA7b"><a href="https://store.example/apps/alpha">Alpha</a></div>
            <div class="Q9MA7b"><a href="https://store.example/apps/beta">Beta</a></div>
            <div class="Q9MA7b"><span>no link here</span></div>
            <div class="Q9MA7b"><a href="https://store.example/apps/gamma">Gamma</a></div>
        </body></html>
    "#;

    fn selectors() -> CompiledSelectors {
        SelectorSet::default().compile().unwrap()
    }

    #[test]
    fn collects_all_anchors_in_dom_order() {
        let urls = collect_detail_urls(LISTING, &selectors(), None);
        assert_eq!(
            urls,
            vec![
                "https://store.example/apps/alpha",
                "https://store.example/apps/beta",
                "https://store.example/apps/gamma",
            ]
        );
    }

    #[test]
    fn truncates_to_limit_keeping_the_first_entries() {
        let urls = collect_detail_urls(LISTING, &selectors(), Some(2));
        assert_eq!(
            urls,
            vec![
                "https://store.example/apps/alpha",
                "https://store.example/apps/beta",
            ]
        );
    }

    #[test]
    fn limit_larger_than_page_returns_everything() {
        let urls = collect_detail_urls(LISTING, &selectors(), Some(10));
        assert_eq!(urls.len(), 3);
    }

    #[test]
    fn entries_without_anchors_are_skipped_not_fatal() {
        let urls = collect_detail_urls(LISTING, &selectors(), None);
        assert!(!urls.iter().any(|u| u.is_empty()));
    }

    #[test]
    fn empty_page_yields_no_urls() {
        let urls = collect_detail_urls("<html><body></body></html>", &selectors(), None);
        assert!(urls.is_empty());
    }
}
