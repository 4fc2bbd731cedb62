//! Listing URL resolution: an explicit URL wins, otherwise the query term
//! is substituted into the storefront's search template.

use url::Url;

use crate::error::Result;

pub const DEFAULT_QUERY: &str = "email";

const SEARCH_BASE: &str = "https://play.google.com/store/search?q=email&c=apps&hl=de&gl=US";

/// The one listing URL the run starts from.
pub fn listing_url(url: Option<&str>, query: &str) -> Result<String> {
    if let Some(url) = url {
        Url::parse(url)?;
        return Ok(url.to_string());
    }

    let mut base = Url::parse(SEARCH_BASE)?;
    let pairs: Vec<(String, String)> = base
        .query_pairs()
        .map(|(key, value)| {
            let value = if key.as_ref() == "q" {
                query.to_string()
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect();
    base.query_pairs_mut().clear().extend_pairs(pairs);
    Ok(base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScrapeError;

    #[test]
    fn explicit_url_passes_through() {
        let url = listing_url(Some("https://store.example/search?q=games"), DEFAULT_QUERY).unwrap();
        assert_eq!(url, "https://store.example/search?q=games");
    }

    #[test]
    fn query_is_substituted_into_the_template() {
        let url = listing_url(None, "puzzle").unwrap();
        assert!(url.contains("q=puzzle"));
        assert!(url.contains("c=apps"));
        assert!(url.contains("hl=de"));
    }

    #[test]
    fn default_query_builds_the_default_listing() {
        let url = listing_url(None, DEFAULT_QUERY).unwrap();
        assert_eq!(url, SEARCH_BASE);
    }

    #[test]
    fn invalid_explicit_url_is_rejected() {
        match listing_url(Some("not a url"), DEFAULT_QUERY) {
            Err(ScrapeError::InvalidUrl(_)) => {}
            other => panic!("expected InvalidUrl, got {other:?}"),
        }
    }
}
