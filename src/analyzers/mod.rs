//! Page-level audits that scrape rendered HTML or probe HTTP responses
//!
//! Each analyzer is a stateless function of a [`Site`] (plus inputs) that
//! returns a flat, serializable metrics struct.

pub mod accessibility;
pub mod broken;
pub mod performance;
pub mod security;
pub mod seo;
pub mod theme_plugin;
pub mod tls;
pub mod users;

use crate::error::{Error, Result};
use crate::fetch::send_checked;
use crate::site::{METADATA_TIMEOUT, Site};
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;

/// Fetch a page and return its HTML
pub(crate) async fn fetch_html(site: &Site, url: &str) -> Result<String> {
    let response = send_checked(site.get(url).timeout(METADATA_TIMEOUT)).await?;
    response.text().await.map_err(Error::transport)
}

/// All elements matching a CSS selector; an invalid selector matches nothing
pub(crate) fn select<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

/// Number of `h1`..`h6` elements, keyed by tag name
pub(crate) fn heading_counts(document: &Html) -> BTreeMap<String, usize> {
    (1..=6)
        .map(|level| {
            let tag = format!("h{}", level);
            let count = select(document, &tag).len();
            (tag, count)
        })
        .collect()
}

/// Trimmed text content of an element
pub(crate) fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
