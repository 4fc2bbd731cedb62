use serde::{Deserialize, Serialize};

/// Placeholder written into fields the extractor could not reliably
/// populate; flags the record for manual review.
pub const SENTINEL: &str = "PLEASE CHECK AGAIN";

/// One scraped app, in the exact shape and order the output columns use.
///
/// The field order here *is* the header row. Every record carries the full
/// field set, defaulted where extraction failed, so rows can never drift
/// out of alignment with the header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppRecord {
    pub name: String,
    pub rating: f32,
    pub rating_count: u64,
    pub download_count: u64,
    pub source_url: String,
    pub size: String,
    pub last_updated: String,
    pub current_version: String,
    pub min_platform_version: String,
    pub age_requirement: String,
    pub publisher: String,
    pub category: String,
}

impl AppRecord {
    /// Column names, in output order. Must mirror the struct fields.
    pub const FIELDS: [&'static str; 12] = [
        "name",
        "rating",
        "rating_count",
        "download_count",
        "source_url",
        "size",
        "last_updated",
        "current_version",
        "min_platform_version",
        "age_requirement",
        "publisher",
        "category",
    ];

    /// An empty record for the given detail URL; the URL is the only field
    /// that is always present.
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            rating: 0.0,
            rating_count: 0,
            download_count: 0,
            source_url: source_url.into(),
            size: String::new(),
            last_updated: String::new(),
            current_version: String::new(),
            min_platform_version: String::new(),
            age_requirement: String::new(),
            publisher: String::new(),
            category: String::new(),
        }
    }
}
