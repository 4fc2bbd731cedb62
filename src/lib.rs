//! Storefront scraper: discovers app detail pages from a listing page,
//! extracts a fixed set of fields from each one and writes the collected
//! records to a delimited file.
//!
//! The flow is three sequential stages: [`discover`] collects detail URLs
//! from the (JavaScript-rendered) listing page, [`pipeline`] visits every
//! URL through a pluggable [`fetch::FetchStrategy`] and runs the
//! [`extract::Extractor`] over each loaded page, and [`writer`] persists
//! whatever was collected. A bad page costs one record, never the run.

pub mod config;
pub mod discover;
pub mod driver;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod pipeline;
pub mod record;
pub mod selectors;
pub mod writer;
