//! Homepage accessibility checks

use super::{fetch_html, heading_counts, select};
use crate::error::Result;
use crate::site::Site;
use scraper::{ElementRef, Html};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Landmark elements counted on the page
const LANDMARKS: &str = "header, nav, main, aside, footer";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccessibilityReport {
    pub total_images: usize,
    pub missing_alt: usize,
    /// `src` of each image with a missing or empty `alt`
    pub missing_alt_list: Vec<String>,
    /// Form fields with neither a `label[for]` nor a wrapping `label`
    pub missing_labels: usize,
    pub empty_links: usize,
    pub empty_links_list: Vec<String>,
    /// Links to in-page anchors (`href="#..."`)
    pub skip_links: usize,
    pub landmarks: usize,
    pub headings: BTreeMap<String, usize>,
}

/// Audit an HTML document
pub fn audit_html(html: &str) -> AccessibilityReport {
    let document = Html::parse_document(html);

    let images = select(&document, "img");
    let missing_alt_list: Vec<String> = images
        .iter()
        .filter(|img| img.value().attr("alt").is_none_or(str::is_empty))
        .map(|img| img.value().attr("src").unwrap_or_default().to_string())
        .collect();

    let labelled: HashSet<&str> = select(&document, "label[for]")
        .iter()
        .filter_map(|l| l.value().attr("for"))
        .collect();
    let missing_labels = select(&document, "input, select, textarea")
        .iter()
        .filter(|field| {
            let by_for = field
                .value()
                .attr("id")
                .is_some_and(|id| labelled.contains(id));
            !by_for && !inside_label(field)
        })
        .count();

    let empty_links_list: Vec<String> = select(&document, "a")
        .iter()
        .filter(|a| a.text().all(|t| t.trim().is_empty()))
        .map(|a| a.value().attr("href").unwrap_or_default().to_string())
        .collect();

    let skip_links = select(&document, "a[href^='#']").len();

    AccessibilityReport {
        total_images: images.len(),
        missing_alt: missing_alt_list.len(),
        missing_alt_list,
        missing_labels,
        empty_links: empty_links_list.len(),
        empty_links_list,
        skip_links,
        landmarks: select(&document, LANDMARKS).len(),
        headings: heading_counts(&document),
    }
}

fn inside_label(element: &ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| a.value().name() == "label")
}

/// Fetch the site homepage and audit it
pub async fn analyze_accessibility(site: &Site) -> Result<AccessibilityReport> {
    let html = fetch_html(site, site.base()).await?;
    Ok(audit_html(&html))
}
