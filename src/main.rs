//! CLI entry point: argument parsing, the interactive retry prompt for a
//! locked output file, and process lifecycle (driver setup, interrupt
//! handling, run timing). All scraping logic lives in the library.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use store_scraper::config;
use store_scraper::discover::Discoverer;
use store_scraper::driver::{self, DriverSession};
use store_scraper::error::ScrapeError;
use store_scraper::extract::Extractor;
use store_scraper::fetch::{FetchStrategy, RenderedFetcher, StaticFetcher};
use store_scraper::pipeline::Pipeline;
use store_scraper::record::AppRecord;
use store_scraper::selectors::SelectorSet;
use store_scraper::writer;

/// Scrapes a storefront in three stages: collect the list of apps to go
/// through, visit each app's detail page for its data, then write
/// everything to a delimited file.
#[derive(Debug, Parser)]
#[command(name = "store-scraper", version)]
struct Args {
    /// Full listing URL, queries included, saying what to look for.
    #[arg(value_name = "URL", conflicts_with = "query")]
    url: Option<String>,

    /// Search query to look for, substituted into the default listing URL.
    #[arg(short, long)]
    query: Option<String>,

    /// Seconds to wait during scroll-down on the listing page. Set to 0
    /// when the page has no dynamically loaded content.
    #[arg(long, default_value_t = 1)]
    scroll: u64,

    /// Maximum number of apps to scrape, in the order the listing proposes
    /// them; -1 takes everything available.
    #[arg(long, default_value_t = -1)]
    quantity: i64,

    /// Location of the chromedriver binary. A directory is searched for
    /// the executable.
    #[arg(short = 'd', long = "web-driver", default_value = "./chromedriver")]
    web_driver: PathBuf,

    /// How detail pages are fetched. The listing page always goes through
    /// the browser; it needs JavaScript either way.
    #[arg(long, value_enum, default_value_t = FetchMode::Rendered)]
    fetch: FetchMode,

    /// Output file. The extension picks the delimiter: .tsv/.txt for tabs,
    /// anything else for commas.
    #[arg(short, long, default_value = "./apps_details.csv")]
    output: PathBuf,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
enum FetchMode {
    Rendered,
    Static,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let started = Utc::now();
    info!("start time: {started}");

    let args = Args::parse();
    let interrupted = match run(args).await {
        Ok(interrupted) => interrupted,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let seconds = Utc::now().signed_duration_since(started).num_seconds();
    info!(
        "done, duration: {}:{}:{} (h:m:s); {seconds}(s)",
        seconds / 3600,
        (seconds / 60) % 60,
        seconds % 60
    );
    if interrupted {
        warn!("[aborted] run was interrupted, partial results only");
    }
}

async fn run(args: Args) -> Result<bool, ScrapeError> {
    let query = args.query.as_deref().unwrap_or(config::DEFAULT_QUERY);
    let listing_url = config::listing_url(args.url.as_deref(), query)?;
    info!("looking through '{listing_url}'");
    if args.output.is_file() {
        warn!(
            "watch out, {} already exists and will be overwritten at the end",
            args.output.display()
        );
    }

    let selectors = SelectorSet::default().compile()?;
    // -1 is the "everything available" sentinel
    let limit = (args.quantity >= 0).then_some(args.quantity as usize);

    // Anything fallible that does not need the browser happens before the
    // session starts; once it is up, shutdown() is the only way out.
    let static_fetcher = match args.fetch {
        FetchMode::Static => Some(StaticFetcher::new()?),
        FetchMode::Rendered => None,
    };

    // Setup fault boundary: a missing driver binary aborts here, before
    // any network activity.
    let session = DriverSession::start(&args.web_driver, driver::DEFAULT_PORT).await?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, finishing up and writing what was collected");
            interrupt.cancel();
        }
    });

    info!("[step 1] accumulating all urls of apps to go through");
    let discoverer = Discoverer::new(session.driver.clone(), selectors.clone());
    let urls = discoverer
        .discover(&listing_url, limit, Duration::from_secs(args.scroll))
        .await;

    info!("[step 2] going through {} detail pages", urls.len());
    let extractor = Extractor::new(selectors.clone());
    let fetcher: Box<dyn FetchStrategy> = match static_fetcher {
        Some(fetcher) => Box::new(fetcher),
        None => Box::new(RenderedFetcher::new(
            session.driver.clone(),
            selectors.raw.detail_marker.clone(),
        )),
    };
    let records = Pipeline::new(fetcher.as_ref(), &extractor)
        .run(&urls, &cancel)
        .await;

    // Release the browser before writing, on success and interrupt alike.
    session.shutdown().await;

    info!("[step 3] writing results to {}", args.output.display());
    write_with_retry(&args.output, &records)?;

    Ok(cancel.is_cancelled())
}

/// The reference behavior for a locked destination: ask on the console
/// whether to retry. The library only reports the typed error; blocking on
/// stdin belongs here and nowhere else.
fn write_with_retry(path: &Path, records: &[AppRecord]) -> Result<(), ScrapeError> {
    loop {
        match writer::write_records(path, records) {
            Ok(_) => return Ok(()),
            Err(ScrapeError::DestinationLocked { path, source }) => {
                warn!(
                    "cannot write {} ({source}); close the file if it is open elsewhere",
                    path.display()
                );
                if !prompt_retry()? {
                    return Err(ScrapeError::DestinationLocked { path, source });
                }
            }
            Err(e) => return Err(e),
        }
    }
}

fn prompt_retry() -> Result<bool, ScrapeError> {
    print!("retry writing? [y/N] ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes"))
}
