use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong across the run.
///
/// Setup faults ([`ScrapeError::DriverMissing`], [`ScrapeError::DriverUnreachable`])
/// abort before any scraping. Per-page faults are caught inside the pipeline
/// and cost a single record. [`ScrapeError::DestinationLocked`] is recoverable;
/// the caller decides whether to retry or abandon.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("web driver binary not found at {}", .0.display())]
    DriverMissing(PathBuf),

    #[error("web driver did not become reachable at {0}")]
    DriverUnreachable(String),

    #[error("browser session error: {0}")]
    Session(#[from] thirtyfour::error::WebDriverError),

    #[error("fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("fetch failed: HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("detail page failed to load: {0}")]
    LoadTimeout(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid CSS selector `{0}`: {1}")]
    BadSelector(String, String),

    #[error("destination is locked or unwritable: {}", .path.display())]
    DestinationLocked {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
