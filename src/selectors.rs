//! CSS selector configuration for one storefront's markup.
//!
//! Selectors are plain data so a markup change means editing one table, not
//! call sites spread through the extractor. The defaults target the Play
//! Store search and detail pages.

use scraper::Selector;

use crate::error::{Result, ScrapeError};

/// The fields living inside the "additional information" container, keyed by
/// child position. The markup is positional, not name-keyed: the Nth child
/// holds the Nth field, and a layout change silently shifts every field
/// after it. That fragility comes with the source markup; this table is the
/// single place that encodes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataField {
    LastUpdated,
    Size,
    DownloadCount,
    CurrentVersion,
    MinPlatformVersion,
}

/// `{ordinal -> field}` mapping for the additional-info container.
pub const METADATA_ORDINALS: [(usize, MetadataField); 5] = [
    (1, MetadataField::LastUpdated),
    (2, MetadataField::Size),
    (3, MetadataField::DownloadCount),
    (4, MetadataField::CurrentVersion),
    (5, MetadataField::MinPlatformVersion),
];

/// Raw selector strings for every element the scraper touches.
#[derive(Debug, Clone)]
pub struct SelectorSet {
    /// One listing entry on the search results page.
    pub listing_item: String,
    /// The anchor inside a listing entry whose href is the detail URL.
    pub listing_anchor: String,
    /// Marker that a detail page has finished loading; its text is the app name.
    pub detail_marker: String,
    pub publisher: String,
    pub category: String,
    pub age_requirement: String,
    /// Human-formatted rating count, e.g. "1,234".
    pub rating_count: String,
    /// Element whose aria-label carries the rating, e.g. "4,5 Sterne".
    pub rating_label: String,
    /// Container whose positional children hold the metadata fields.
    pub additional_info: String,
}

impl Default for SelectorSet {
    fn default() -> Self {
        Self {
            listing_item: ".Q9MA7b".into(),
            listing_anchor: "a".into(),
            detail_marker: ".AHFaub".into(),
            publisher: "a.hrTbp.R8zArc".into(),
            category: "a[itemprop='genre']".into(),
            age_requirement: "[itemprop='contentRating'] span".into(),
            rating_count: "span.AYi5wd".into(),
            rating_label: ".pf5lIe>div".into(),
            additional_info: ".IxB2fe".into(),
        }
    }
}

impl SelectorSet {
    /// Parses every selector up front so a typo fails the run at startup,
    /// not halfway through extraction.
    pub fn compile(self) -> Result<CompiledSelectors> {
        let metadata = METADATA_ORDINALS
            .iter()
            .map(|&(ordinal, field)| {
                let css = format!("div:nth-child({ordinal})>span");
                Ok((parse(&css)?, field))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(CompiledSelectors {
            listing_item: parse(&self.listing_item)?,
            listing_anchor: parse(&self.listing_anchor)?,
            detail_name: parse(&self.detail_marker)?,
            publisher: parse(&self.publisher)?,
            category: parse(&self.category)?,
            age_requirement: parse(&self.age_requirement)?,
            rating_count: parse(&self.rating_count)?,
            rating_label: parse(&self.rating_label)?,
            additional_info: parse(&self.additional_info)?,
            metadata,
            raw: self,
        })
    }
}

fn parse(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScrapeError::BadSelector(css.to_string(), e.to_string()))
}

/// Pre-parsed selectors, ready for querying. Keeps the raw strings around
/// because the browser-side waits need CSS text, not `scraper` selectors.
#[derive(Debug, Clone)]
pub struct CompiledSelectors {
    pub raw: SelectorSet,
    pub listing_item: Selector,
    pub listing_anchor: Selector,
    pub detail_name: Selector,
    pub publisher: Selector,
    pub category: Selector,
    pub age_requirement: Selector,
    pub rating_count: Selector,
    pub rating_label: Selector,
    pub additional_info: Selector,
    pub metadata: Vec<(Selector, MetadataField)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_set_compiles() {
        let compiled = SelectorSet::default().compile().unwrap();
        assert_eq!(compiled.metadata.len(), METADATA_ORDINALS.len());
    }

    #[test]
    fn bad_selector_is_reported_with_its_source() {
        let set = SelectorSet {
            rating_label: ":::".into(),
            ..SelectorSet::default()
        };
        match set.compile() {
            Err(ScrapeError::BadSelector(css, _)) => assert_eq!(css, ":::"),
            other => panic!("expected BadSelector, got {other:?}"),
        }
    }
}
