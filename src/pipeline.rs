//! Sequential orchestration over the discovered detail URLs.
//!
//! Each URL is fetched and extracted in discovery order; a failure on one
//! URL is logged and costs exactly that record. Cancellation is honored
//! between iterations so an interrupted run still hands back everything
//! collected so far.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::extract::Extractor;
use crate::fetch::FetchStrategy;
use crate::record::AppRecord;

pub struct Pipeline<'a> {
    fetcher: &'a dyn FetchStrategy,
    extractor: &'a Extractor,
}

impl<'a> Pipeline<'a> {
    pub fn new(fetcher: &'a dyn FetchStrategy, extractor: &'a Extractor) -> Self {
        Self { fetcher, extractor }
    }

    /// Visits every URL in order and returns the records that extracted
    /// cleanly, in that same order. The output may be shorter than the
    /// input; failed URLs leave no placeholder.
    pub async fn run(&self, detail_urls: &[String], cancel: &CancellationToken) -> Vec<AppRecord> {
        let total = detail_urls.len();
        let mut records = Vec::with_capacity(total);

        for (index, url) in detail_urls.iter().enumerate() {
            if cancel.is_cancelled() {
                warn!(
                    "interrupted after {index}/{total} pages, keeping what was collected"
                );
                break;
            }
            match self.fetcher.load(url).await {
                Ok(document) => {
                    records.push(self.extractor.extract(&document));
                    info!("processed {}/{} pages", index + 1, total);
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "page skipped");
                }
            }
        }
        records
    }
}
