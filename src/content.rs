//! Content inventory aggregation
//!
//! Pulls every REST collection the audit cares about, derives the archive
//! pages, and assembles a [`ContentReport`]. Each stage is fault-isolated: a
//! failing source contributes nothing and one error string, and the remaining
//! stages still run.

use crate::archive::{ArchiveSet, synthesize_archives};
use crate::discovery::discover_public_types;
use crate::error::{Error, Result};
use crate::fetch::fetch_all;
use crate::records::{Author, ContentRecord, MediaRecord, TaxonomyTerm};
use crate::report::{
    ARCHIVES_GROUP, ContentReport, MEDIA_GROUP, MediaEntry, PAGES_GROUP, POSTS_GROUP,
    ReportGroup, Summary, custom_type_group, normalize,
};
use crate::site::{PROBE_TIMEOUT, Site};
use futures::stream::{self, StreamExt};
use reqwest::header::CONTENT_LENGTH;
use std::fmt::Display;
use tracing::{debug, info, warn};

/// Maximum in-flight sub-requests within one stage
pub const STAGE_CONCURRENCY: usize = 8;

/// Filter limiting posts and custom types to published items
const PUBLISHED: &[(&str, &str)] = &[("status", "publish")];

/// Result of one aggregation stage: its value, degraded to empty on failure,
/// plus the errors it recorded.
#[derive(Debug)]
pub struct StageOutcome<T> {
    pub value: T,
    pub errors: Vec<String>,
}

impl<T> StageOutcome<T> {
    pub fn ok(value: T) -> Self {
        Self {
            value,
            errors: Vec::new(),
        }
    }

    /// Keep the successful value, or fall back to the default and record
    /// `{label}: {error}`
    pub fn from_result<E: Display>(result: std::result::Result<T, E>, label: &str) -> Self
    where
        T: Default,
    {
        match result {
            Ok(value) => Self::ok(value),
            Err(e) => {
                warn!(stage = label, error = %e, "source failed");
                Self {
                    value: T::default(),
                    errors: vec![format!("{}: {}", label, e)],
                }
            }
        }
    }
}

/// One content collection destined for its own report group
#[derive(Debug, Clone)]
pub struct ContentSource {
    pub group: String,
    /// Custom type key, `None` for the built-in pages and posts
    pub type_key: Option<String>,
    pub records: Vec<ContentRecord>,
}

#[derive(Debug, Default)]
struct PagesAndPosts {
    pages: Vec<ContentRecord>,
    posts: Vec<ContentRecord>,
}

/// Build the content inventory of a site.
///
/// Never fails: errors from individual sources end up in
/// `summary.errors` and the report is returned with whatever succeeded.
pub async fn aggregate_content(site: &Site) -> ContentReport {
    info!(site = site.base(), "aggregating content");

    let (builtins, custom, media) = tokio::join!(
        fetch_pages_and_posts(site),
        fetch_custom_types(site),
        fetch_media(site),
    );
    let archives = fetch_archives(site, &builtins.value.posts).await;

    let mut errors = Vec::new();
    errors.extend(builtins.errors);
    errors.extend(custom.errors);
    errors.extend(media.errors);
    errors.extend(archives.errors);

    let PagesAndPosts { pages, posts } = builtins.value;
    let mut sources = vec![
        ContentSource {
            group: PAGES_GROUP.to_string(),
            type_key: None,
            records: pages,
        },
        ContentSource {
            group: POSTS_GROUP.to_string(),
            type_key: None,
            records: posts,
        },
    ];
    sources.extend(custom.value);

    let report = assemble(sources, media.value, archives.value, errors);
    info!(
        items = report.item_count(),
        errors = report.summary.errors.len(),
        "content aggregation finished"
    );
    report
}

/// Assemble groups in their fixed order and compute the summary
pub fn assemble(
    sources: Vec<ContentSource>,
    media: Vec<MediaEntry>,
    archives: ArchiveSet,
    errors: Vec<String>,
) -> ContentReport {
    let mut summary = Summary {
        errors,
        ..Summary::default()
    };
    let mut groups = Vec::with_capacity(sources.len() + 2);

    for source in sources {
        match source.type_key {
            Some(key) => {
                summary.cpts.insert(key, source.records.len());
            }
            None if source.group == PAGES_GROUP => summary.pages = source.records.len(),
            None if source.group == POSTS_GROUP => summary.posts = source.records.len(),
            None => {}
        }
        groups.push(ReportGroup::new(source.group, normalize(&source.records)));
    }

    summary.media = media.len();
    groups.push(ReportGroup::new(MEDIA_GROUP, normalize(&media)));

    summary.archives = archives.len();
    groups.push(ReportGroup::new(ARCHIVES_GROUP, normalize(archives.iter())));

    ContentReport { groups, summary }
}

async fn fetch_pages_and_posts(site: &Site) -> StageOutcome<PagesAndPosts> {
    let result: Result<PagesAndPosts> = async {
        let pages = fetch_all(site, &site.api_endpoint("pages"), &[]).await?;
        let posts = fetch_all(site, &site.api_endpoint("posts"), PUBLISHED).await?;
        Ok::<_, Error>(PagesAndPosts { pages, posts })
    }
    .await;
    StageOutcome::from_result(result, "Pages/Posts error")
}

async fn fetch_custom_types(site: &Site) -> StageOutcome<Vec<ContentSource>> {
    let discovered = StageOutcome::from_result(discover_public_types(site).await, "Types error");
    let mut errors = discovered.errors;
    debug!(types = ?discovered.value, "discovered custom types");

    let fetched: Vec<(String, Result<Vec<ContentRecord>>)> = stream::iter(discovered.value)
        .map(|key| async move {
            let records = fetch_all(site, &site.api_endpoint(&key), PUBLISHED).await;
            (key, records)
        })
        .buffered(STAGE_CONCURRENCY)
        .collect()
        .await;

    let mut sources = Vec::with_capacity(fetched.len());
    for (key, result) in fetched {
        let outcome = StageOutcome::from_result(result, &format!("CPT {} error", key));
        errors.extend(outcome.errors);
        sources.push(ContentSource {
            group: custom_type_group(&key),
            type_key: Some(key),
            records: outcome.value,
        });
    }

    StageOutcome {
        value: sources,
        errors,
    }
}

async fn fetch_media(site: &Site) -> StageOutcome<Vec<MediaEntry>> {
    let records: StageOutcome<Vec<MediaRecord>> = StageOutcome::from_result(
        fetch_all(site, &site.api_endpoint("media"), &[]).await,
        "Media error",
    );

    let entries: Vec<MediaEntry> = stream::iter(records.value)
        .map(|record| async move {
            let size = probe_size(site, record.source_url.as_deref().unwrap_or_default()).await;
            MediaEntry { record, size }
        })
        .buffered(STAGE_CONCURRENCY)
        .collect()
        .await;

    StageOutcome {
        value: entries,
        errors: records.errors,
    }
}

/// Best-effort byte size of an asset from a HEAD request's Content-Length.
///
/// Error statuses count as unknown size.
async fn probe_size(site: &Site, url: &str) -> Option<u64> {
    if url.is_empty() {
        return None;
    }
    let response = site
        .client()
        .head(url)
        .timeout(PROBE_TIMEOUT)
        .send()
        .await
        .inspect_err(|e| debug!(url, error = %e, "media size probe failed"))
        .ok()?;
    if !response.status().is_success() {
        debug!(url, status = response.status().as_u16(), "media size probe rejected");
        return None;
    }
    response
        .headers()
        .get(CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

async fn fetch_archives(site: &Site, posts: &[ContentRecord]) -> StageOutcome<ArchiveSet> {
    let result: Result<ArchiveSet> = async {
        let categories: Vec<TaxonomyTerm> =
            fetch_all(site, &site.api_endpoint("categories"), &[]).await?;
        let tags: Vec<TaxonomyTerm> = fetch_all(site, &site.api_endpoint("tags"), &[]).await?;
        let authors: Vec<Author> = fetch_all(site, &site.api_endpoint("users"), &[]).await?;
        Ok::<_, Error>(synthesize_archives(
            site.base(),
            &categories,
            &tags,
            &authors,
            posts,
        ))
    }
    .await;
    StageOutcome::from_result(result, "Archives error")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Rendered;

    fn record(id: u64, title: &str) -> ContentRecord {
        ContentRecord {
            id,
            title: Some(Rendered {
                rendered: title.to_string(),
            }),
            slug: None,
            link: Some(format!("https://example.com/?p={}", id)),
            status: Some("publish".to_string()),
            date: None,
        }
    }

    #[test]
    fn stage_outcome_records_labelled_error() {
        let outcome: StageOutcome<Vec<u8>> =
            StageOutcome::from_result(Err(Error::HttpStatus(500)), "Types error");

        assert!(outcome.value.is_empty());
        assert_eq!(outcome.errors, vec!["Types error: HTTP error: status 500"]);
    }

    #[test]
    fn assemble_orders_groups_and_counts() {
        let sources = vec![
            ContentSource {
                group: PAGES_GROUP.into(),
                type_key: None,
                records: vec![record(2, "About"), record(1, "Home")],
            },
            ContentSource {
                group: POSTS_GROUP.into(),
                type_key: None,
                records: vec![record(10, "Hello")],
            },
            ContentSource {
                group: custom_type_group("product"),
                type_key: Some("product".into()),
                records: vec![record(20, "Widget")],
            },
            ContentSource {
                group: custom_type_group("event"),
                type_key: Some("event".into()),
                records: vec![],
            },
        ];

        let report = assemble(sources, vec![], ArchiveSet::new(), vec!["CPT x error".into()]);

        let names: Vec<&str> = report.groups.iter().map(|g| g.category.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Pages",
                "Posts",
                "CPT - product",
                "CPT - event",
                "Media Library",
                "Archivi"
            ]
        );
        let page_ids: Vec<Option<u64>> = report.groups[0].items.iter().map(|i| i.id).collect();
        assert_eq!(page_ids, vec![Some(2), Some(1)]);
        assert_eq!(report.summary.pages, 2);
        assert_eq!(report.summary.posts, 1);
        assert_eq!(report.summary.cpts.get("product"), Some(&1));
        assert_eq!(report.summary.cpts.get("event"), Some(&0));
        assert_eq!(report.summary.errors, vec!["CPT x error"]);
    }
}
