//! Uniform content report
//!
//! Every source record shape (pages, posts, custom type items, media,
//! archives) is flattened into a [`ReportItem`] so exporters, renderers and
//! snapshot diffs only deal with one structure.

use crate::archive::ArchiveDescriptor;
use crate::records::{ContentRecord, MediaRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const PAGES_GROUP: &str = "Pages";
pub const POSTS_GROUP: &str = "Posts";
pub const MEDIA_GROUP: &str = "Media Library";
pub const ARCHIVES_GROUP: &str = "Archivi";

/// Status marker for media items
pub const MEDIA_STATUS: &str = "media";

/// Group name for a custom post type
pub fn custom_type_group(type_key: &str) -> String {
    format!("CPT - {}", type_key)
}

/// One normalized row of the content inventory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportItem {
    /// REST id; archives have none
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub status: String,
    /// Byte size, only known for media whose HEAD probe succeeded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// Named bucket of report items
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportGroup {
    pub category: String,
    #[serde(default)]
    pub items: Vec<ReportItem>,
}

impl ReportGroup {
    pub fn new(category: impl Into<String>, items: Vec<ReportItem>) -> Self {
        Self {
            category: category.into(),
            items,
        }
    }
}

/// Counts per source plus one error string per failed source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub pages: usize,
    pub posts: usize,
    pub media: usize,
    pub cpts: BTreeMap<String, usize>,
    pub archives: usize,
    pub errors: Vec<String>,
}

impl Summary {
    pub fn is_partial(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Complete content inventory of a site
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentReport {
    pub groups: Vec<ReportGroup>,
    pub summary: Summary,
}

impl ContentReport {
    /// Look up a group by name
    pub fn group(&self, category: &str) -> Option<&ReportGroup> {
        self.groups.iter().find(|g| g.category == category)
    }

    /// Total number of items across all groups
    pub fn item_count(&self) -> usize {
        self.groups.iter().map(|g| g.items.len()).sum()
    }
}

/// A media record together with its probed byte size
#[derive(Debug, Clone)]
pub struct MediaEntry {
    pub record: MediaRecord,
    pub size: Option<u64>,
}

impl From<&ContentRecord> for ReportItem {
    fn from(record: &ContentRecord) -> Self {
        let title = record
            .rendered_title()
            .or(record.slug.as_deref())
            .unwrap_or_default();
        Self {
            id: Some(record.id),
            title: title.to_string(),
            link: record.link.clone().unwrap_or_default(),
            status: record.status.clone().unwrap_or_default(),
            size: None,
        }
    }
}

impl From<&MediaEntry> for ReportItem {
    fn from(entry: &MediaEntry) -> Self {
        Self {
            id: Some(entry.record.id),
            title: entry
                .record
                .title
                .as_ref()
                .map(|t| t.rendered.clone())
                .unwrap_or_default(),
            link: entry.record.source_url.clone().unwrap_or_default(),
            status: MEDIA_STATUS.to_string(),
            size: entry.size,
        }
    }
}

impl From<&ArchiveDescriptor> for ReportItem {
    fn from(archive: &ArchiveDescriptor) -> Self {
        Self {
            id: None,
            title: archive.label.clone(),
            link: archive.link.clone(),
            status: archive.status().to_string(),
            size: None,
        }
    }
}

/// Normalize any slice of source records into report items
pub fn normalize<'a, T: 'a>(records: impl IntoIterator<Item = &'a T>) -> Vec<ReportItem>
where
    ReportItem: From<&'a T>,
{
    records.into_iter().map(ReportItem::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Rendered;
    use serde_json::json;

    fn record(title: Option<&str>, slug: Option<&str>) -> ContentRecord {
        ContentRecord {
            id: 42,
            title: title.map(|t| Rendered {
                rendered: t.to_string(),
            }),
            slug: slug.map(str::to_string),
            link: Some("https://example.com/item/".to_string()),
            status: Some("publish".to_string()),
            date: None,
        }
    }

    #[test]
    fn content_record_uses_rendered_title() {
        let item = ReportItem::from(&record(Some("Hello"), Some("hello")));
        assert_eq!(item.id, Some(42));
        assert_eq!(item.title, "Hello");
        assert_eq!(item.status, "publish");
        assert_eq!(item.size, None);
    }

    #[test]
    fn custom_type_item_falls_back_to_slug() {
        let item = ReportItem::from(&record(None, Some("fallback-slug")));
        assert_eq!(item.title, "fallback-slug");

        let bare = ReportItem::from(&record(None, None));
        assert_eq!(bare.title, "");
    }

    #[test]
    fn media_entry_carries_size_and_source_url() {
        let entry = MediaEntry {
            record: MediaRecord {
                id: 5,
                title: Some(Rendered {
                    rendered: "Logo".to_string(),
                }),
                source_url: Some("https://example.com/logo.png".to_string()),
            },
            size: Some(2048),
        };

        let item = ReportItem::from(&entry);
        assert_eq!(item.link, "https://example.com/logo.png");
        assert_eq!(item.status, "media");
        assert_eq!(item.size, Some(2048));
    }

    #[test]
    fn items_serialize_without_unknown_size() {
        let item = ReportItem {
            id: Some(1),
            title: "Home".into(),
            link: "http://x".into(),
            status: "publish".into(),
            size: None,
        };
        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            json!({ "id": 1, "title": "Home", "link": "http://x", "status": "publish" })
        );
    }

    #[test]
    fn report_accepts_sparse_items_from_clients() {
        let report: ContentReport = serde_json::from_value(json!({
            "groups": [{ "category": "Pages", "items": [{ "link": "http://x" }] }],
            "summary": { "pages": 1, "posts": 0, "media": 0, "cpts": {}, "archives": 0, "errors": [] }
        }))
        .unwrap();

        assert_eq!(report.item_count(), 1);
        assert_eq!(report.group("Pages").unwrap().items[0].link, "http://x");
    }
}
