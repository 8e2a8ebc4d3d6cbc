//! On-page SEO metrics for every page and published post

use super::{element_text, fetch_html, heading_counts, select};
use crate::content::STAGE_CONCURRENCY;
use crate::error::Result;
use crate::fetch::fetch_all;
use crate::records::ContentRecord;
use crate::site::Site;
use futures::stream::{self, StreamExt};
use scraper::Html;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Meta description length range that earns points
const DESCRIPTION_RANGE: std::ops::RangeInclusive<usize> = 50..=160;

/// SEO metrics extracted from one rendered page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeoMetrics {
    pub title_tag: String,
    pub meta_desc: String,
    pub headings: BTreeMap<String, usize>,
    pub score: u32,
    pub canonical: String,
    pub og: BTreeMap<String, String>,
    pub twitter: BTreeMap<String, String>,
}

/// SEO metrics of a page or post, keyed by its REST identity
#[derive(Debug, Clone, Serialize)]
pub struct SeoEntry {
    pub id: u64,
    pub title: String,
    pub link: String,
    #[serde(flatten)]
    pub metrics: SeoMetrics,
}

/// Basic SEO score out of 100.
///
/// Title present: 20. Description of 50 to 160 characters: 20. At least one
/// `h1`: 20. Headings: 5 per heading across all levels, at most 40.
pub fn compute_seo_score(
    title_tag: &str,
    meta_desc: &str,
    headings: &BTreeMap<String, usize>,
) -> u32 {
    let mut score = 0;
    if !title_tag.is_empty() {
        score += 20;
    }
    if DESCRIPTION_RANGE.contains(&meta_desc.chars().count()) {
        score += 20;
    }
    if headings.get("h1").copied().unwrap_or(0) >= 1 {
        score += 20;
    }
    let total: usize = headings.values().sum();
    score += (total.saturating_mul(5)).min(40) as u32;
    score.min(100)
}

/// Extract SEO metrics from an HTML document
pub fn extract_seo(html: &str) -> SeoMetrics {
    let document = Html::parse_document(html);

    let title_tag = select(&document, "title")
        .first()
        .map(element_text)
        .unwrap_or_default();
    let meta_desc = select(&document, "meta[name='description']")
        .first()
        .and_then(|m| m.value().attr("content"))
        .map(|c| c.trim().to_string())
        .unwrap_or_default();
    let headings = heading_counts(&document);
    let canonical = select(&document, "link[rel~='canonical']")
        .first()
        .and_then(|l| l.value().attr("href"))
        .unwrap_or_default()
        .to_string();

    let meta_map = |css: &str, key_attr: &str| -> BTreeMap<String, String> {
        select(&document, css)
            .iter()
            .filter_map(|m| {
                let key = m.value().attr(key_attr)?;
                let content = m.value().attr("content").unwrap_or_default();
                Some((key.to_string(), content.to_string()))
            })
            .collect()
    };
    let og = meta_map("meta[property^='og:']", "property");
    let twitter = meta_map("meta[name^='twitter:']", "name");

    let score = compute_seo_score(&title_tag, &meta_desc, &headings);

    SeoMetrics {
        title_tag,
        meta_desc,
        headings,
        score,
        canonical,
        og,
        twitter,
    }
}

/// Fetch and analyze one page; an unreachable page yields empty metrics
pub async fn analyze_page(site: &Site, url: &str) -> SeoMetrics {
    match fetch_html(site, url).await {
        Ok(html) => extract_seo(&html),
        Err(e) => {
            debug!(url, error = %e, "SEO page fetch failed");
            SeoMetrics::default()
        }
    }
}

/// SEO metrics for every page and published post of the site
pub async fn audit_seo(site: &Site) -> Result<Vec<SeoEntry>> {
    let pages: Vec<ContentRecord> = fetch_all(site, &site.api_endpoint("pages"), &[]).await?;
    let posts: Vec<ContentRecord> =
        fetch_all(site, &site.api_endpoint("posts"), &[("status", "publish")]).await?;

    let entries = stream::iter(pages.into_iter().chain(posts))
        .map(|record| async move {
            let link = record.link.clone().unwrap_or_default();
            let metrics = analyze_page(site, &link).await;
            SeoEntry {
                id: record.id,
                title: record.rendered_title().unwrap_or_default().to_string(),
                link,
                metrics,
            }
        })
        .buffered(STAGE_CONCURRENCY)
        .collect()
        .await;

    Ok(entries)
}
