//! Field extraction from a loaded detail page.
//!
//! Fields come in three groups (header, rating, metadata) and each group is
//! fault-isolated: a missing or malformed group falls back to its documented
//! defaults and the rest of the record is still extracted. The offending URL
//! and whatever name was already recovered go to the log so the row can be
//! found again.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;

use crate::fetch::PageDocument;
use crate::record::{AppRecord, SENTINEL};
use crate::selectors::{CompiledSelectors, MetadataField};

static FLOAT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-+]?\d*\.\d+|\d+").expect("float pattern"));

pub struct Extractor {
    selectors: CompiledSelectors,
}

impl Extractor {
    pub fn new(selectors: CompiledSelectors) -> Self {
        Self { selectors }
    }

    /// Builds the record for one detail page. Pure over the snapshot: no
    /// network, no session access. Always returns a full-shape record; only
    /// the values vary with what the page had.
    pub fn extract(&self, document: &PageDocument) -> AppRecord {
        let dom = document.parse();
        let mut record = AppRecord::new(&document.url);
        self.header_group(&dom, &mut record);
        self.rating_group(&dom, &mut record);
        self.metadata_group(&dom, &mut record);
        record
    }

    /// Name, age requirement, publisher, category. The name has no default;
    /// later groups use whatever was recovered for their diagnostics.
    fn header_group(&self, dom: &Html, record: &mut AppRecord) {
        match first_text(dom, &self.selectors.detail_name) {
            Some(name) => record.name = name,
            None => warn!(url = %record.source_url, "app name missing"),
        }
        record.publisher = first_text(dom, &self.selectors.publisher).unwrap_or_default();
        record.category = first_text(dom, &self.selectors.category).unwrap_or_else(|| {
            warn!(url = %record.source_url, name = %record.name, "category missing, marked for manual review");
            SENTINEL.to_string()
        });
        record.age_requirement = first_text(dom, &self.selectors.age_requirement)
            .unwrap_or_else(|| {
                warn!(url = %record.source_url, name = %record.name, "age requirement missing, marked for manual review");
                SENTINEL.to_string()
            });
    }

    /// Rating value and rating count. Both come from the short-description
    /// block; if either element is absent the whole group defaults to zero.
    fn rating_group(&self, dom: &Html, record: &mut AppRecord) {
        let count_text = first_text(dom, &self.selectors.rating_count);
        let label = dom
            .select(&self.selectors.rating_label)
            .next()
            .and_then(|el| el.value().attr("aria-label").map(str::to_owned));

        let (Some(count_text), Some(label)) = (count_text, label) else {
            warn!(url = %record.source_url, name = %record.name, "missing rating");
            return;
        };
        record.rating_count = parse_grouped_count(&count_text).unwrap_or_else(|| {
            warn!(url = %record.source_url, name = %record.name, count = %count_text, "rating count unparsable");
            0
        });
        record.rating = parse_rating_label(&label).unwrap_or_else(|| {
            warn!(url = %record.source_url, name = %record.name, label = %label, "rating label unparsable");
            0.0
        });
    }

    /// Last update, size, download count, current version, minimum platform
    /// version, read positionally out of the additional-info container. An
    /// unparsable download count zeroes the count and marks both version
    /// fields for manual review, matching how a shifted layout usually
    /// shows up first.
    fn metadata_group(&self, dom: &Html, record: &mut AppRecord) {
        let Some(container) = dom.select(&self.selectors.additional_info).next() else {
            warn!(url = %record.source_url, name = %record.name, "additional info section missing, marked for manual review");
            record.current_version = SENTINEL.to_string();
            record.min_platform_version = SENTINEL.to_string();
            return;
        };

        let mut count_malformed = false;
        for (selector, field) in &self.selectors.metadata {
            let text = scoped_text(container, selector);
            match field {
                MetadataField::LastUpdated => record.last_updated = text.unwrap_or_default(),
                MetadataField::Size => record.size = text.unwrap_or_default(),
                MetadataField::DownloadCount => {
                    record.download_count = match text.as_deref().and_then(parse_grouped_count) {
                        Some(count) => count,
                        None => {
                            warn!(
                                url = %record.source_url,
                                name = %record.name,
                                "download count unparsable, version fields marked for manual review"
                            );
                            count_malformed = true;
                            0
                        }
                    };
                }
                MetadataField::CurrentVersion => {
                    record.current_version = text.unwrap_or_default();
                }
                MetadataField::MinPlatformVersion => {
                    record.min_platform_version = text.unwrap_or_default();
                }
            }
        }

        if count_malformed {
            record.current_version = SENTINEL.to_string();
            record.min_platform_version = SENTINEL.to_string();
        }
    }
}

/// Parses a human-formatted count: thousands separators (dot or comma) and a
/// trailing "+" are dropped, so "10.000+" and "10,000+" both give 10000.
pub fn parse_grouped_count(text: &str) -> Option<u64> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '.' | '+'))
        .collect();
    cleaned.parse().ok()
}

/// Pulls the rating out of a label like "4,5 Sterne": the locale comma is
/// normalized to a dot, then the first floating-point-looking substring wins.
pub fn parse_rating_label(label: &str) -> Option<f32> {
    let normalized = label.replace(',', ".");
    FLOAT_RE
        .find(&normalized)
        .and_then(|m| m.as_str().parse().ok())
}

fn first_text(dom: &Html, selector: &Selector) -> Option<String> {
    dom.select(selector)
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty())
}

fn scoped_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope
        .select(selector)
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty())
}

fn element_text(element: ElementRef<'_>) -> String {
    let text: String = element.text().collect::<Vec<_>>().join(" ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selectors::SelectorSet;

    const DETAIL: &str = r#"
        <html><body>
            <h1 class="AHFaub"><span>Mail Master</span></h1>
            <a class="hrTbp R8zArc" href="/dev?id=1">Example Labs</a>
            <a itemprop="genre" href="/category/COMMUNICATION">Communication</a>
            <div itemprop="contentRating"><span>USK: All ages</span></div>
            <span class="AYi5wd">1,234</span>
            <div class="pf5lIe"><div aria-label="4,5 Sterne von 5 Sternen"></div></div>
            <div class="IxB2fe">
                <div><span>August 12, 2025</span></div>
                <div><span>12M</span></div>
                <div><span>10.000+</span></div>
                <div><span>2.4.1</span></div>
                <div><span>5.0 and up</span></div>
            </div>
        </body></html>
    "#;

    fn extractor() -> Extractor {
        Extractor::new(SelectorSet::default().compile().unwrap())
    }

    fn doc(html: &str) -> PageDocument {
        PageDocument::new("https://store.example/apps/mail-master", html)
    }

    #[test]
    fn full_page_extracts_every_field() {
        let record = extractor().extract(&doc(DETAIL));
        assert_eq!(record.name, "Mail Master");
        assert_eq!(record.publisher, "Example Labs");
        assert_eq!(record.category, "Communication");
        assert_eq!(record.age_requirement, "USK: All ages");
        assert_eq!(record.rating, 4.5);
        assert_eq!(record.rating_count, 1234);
        assert_eq!(record.download_count, 10_000);
        assert_eq!(record.last_updated, "August 12, 2025");
        assert_eq!(record.size, "12M");
        assert_eq!(record.current_version, "2.4.1");
        assert_eq!(record.min_platform_version, "5.0 and up");
        assert_eq!(record.source_url, "https://store.example/apps/mail-master");
    }

    #[test]
    fn missing_rating_block_defaults_both_rating_fields_to_zero() {
        let html = DETAIL.replace("pf5lIe", "gone");
        let record = extractor().extract(&doc(&html));
        assert_eq!(record.rating, 0.0);
        assert_eq!(record.rating_count, 0);
        // the other groups are unaffected
        assert_eq!(record.name, "Mail Master");
        assert_eq!(record.download_count, 10_000);
    }

    #[test]
    fn malformed_download_count_marks_version_fields() {
        let html = DETAIL.replace("10.000+", "ten thousand");
        let record = extractor().extract(&doc(&html));
        assert_eq!(record.download_count, 0);
        assert_eq!(record.current_version, SENTINEL);
        assert_eq!(record.min_platform_version, SENTINEL);
        assert_eq!(record.last_updated, "August 12, 2025");
    }

    #[test]
    fn missing_additional_info_marks_version_fields() {
        let html = DETAIL.replace("IxB2fe", "gone");
        let record = extractor().extract(&doc(&html));
        assert_eq!(record.download_count, 0);
        assert_eq!(record.current_version, SENTINEL);
        assert_eq!(record.min_platform_version, SENTINEL);
        assert_eq!(record.last_updated, "");
    }

    #[test]
    fn missing_header_elements_use_their_defaults() {
        let html = "<html><body><h1 class='AHFaub'>Bare App</h1></body></html>";
        let record = extractor().extract(&doc(html));
        assert_eq!(record.name, "Bare App");
        assert_eq!(record.publisher, "");
        assert_eq!(record.category, SENTINEL);
        assert_eq!(record.age_requirement, SENTINEL);
    }

    #[test]
    fn record_for_empty_page_keeps_the_source_url() {
        let record = extractor().extract(&doc("<html><body></body></html>"));
        assert_eq!(record.name, "");
        assert_eq!(record.source_url, "https://store.example/apps/mail-master");
    }

    #[test]
    fn grouped_counts_accept_both_separator_conventions() {
        assert_eq!(parse_grouped_count("10.000+"), Some(10_000));
        assert_eq!(parse_grouped_count("10,000+"), Some(10_000));
        assert_eq!(parse_grouped_count("1,234"), Some(1_234));
        assert_eq!(parse_grouped_count(" 500 "), Some(500));
        assert_eq!(parse_grouped_count("ten thousand"), None);
        assert_eq!(parse_grouped_count(""), None);
    }

    #[test]
    fn rating_labels_normalize_the_locale_comma() {
        assert_eq!(parse_rating_label("4,5 Sterne von 5"), Some(4.5));
        assert_eq!(parse_rating_label("4.5 stars out of 5"), Some(4.5));
        assert_eq!(parse_rating_label("Mit 3 Sternen bewertet"), Some(3.0));
        assert_eq!(parse_rating_label("no digits here"), None);
    }
}
