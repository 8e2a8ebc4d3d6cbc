//! Raw WordPress REST record shapes
//!
//! Only the fields the audit reads are modelled; everything else in the API
//! response is ignored.

use serde::{Deserialize, Serialize};

/// `{ "rendered": "..." }` wrapper used for titles
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rendered {
    #[serde(default)]
    pub rendered: String,
}

/// A page, post or custom post type item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: u64,
    pub title: Option<Rendered>,
    pub slug: Option<String>,
    pub link: Option<String>,
    pub status: Option<String>,
    /// Publication timestamp, ISO-8601 in site local time
    pub date: Option<String>,
}

/// Media library attachment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRecord {
    pub id: u64,
    pub title: Option<Rendered>,
    pub source_url: Option<String>,
}

/// Category or tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyTerm {
    pub id: u64,
    pub slug: Option<String>,
    pub name: Option<String>,
}

/// Registered user, as exposed by `/users`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: u64,
    pub slug: Option<String>,
    pub name: Option<String>,
}

impl ContentRecord {
    /// Rendered title, if the record carries one
    pub fn rendered_title(&self) -> Option<&str> {
        self.title.as_ref().map(|t| t.rendered.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn content_record_tolerates_sparse_items() {
        let record: ContentRecord = serde_json::from_value(json!({
            "id": 7,
            "slug": "hello",
            "extra": { "ignored": true }
        }))
        .unwrap();

        assert_eq!(record.id, 7);
        assert_eq!(record.rendered_title(), None);
        assert_eq!(record.slug.as_deref(), Some("hello"));
        assert!(record.date.is_none());
    }

    #[test]
    fn media_record_reads_nested_title() {
        let media: MediaRecord = serde_json::from_value(json!({
            "id": 3,
            "title": { "rendered": "Logo" },
            "source_url": "https://example.com/logo.png"
        }))
        .unwrap();

        assert_eq!(media.title.unwrap().rendered, "Logo");
        assert_eq!(media.source_url.as_deref(), Some("https://example.com/logo.png"));
    }

    #[test]
    fn null_fields_read_as_missing() {
        let media: MediaRecord =
            serde_json::from_value(json!({ "id": 4, "title": null, "source_url": null })).unwrap();
        let term: TaxonomyTerm =
            serde_json::from_value(json!({ "id": 2, "slug": null, "name": null })).unwrap();
        let author: Author =
            serde_json::from_value(json!({ "id": 1, "slug": "admin", "name": null })).unwrap();

        assert_eq!(media.source_url, None);
        assert_eq!(term.slug, None);
        assert_eq!(term.name, None);
        assert_eq!(author.slug.as_deref(), Some("admin"));
        assert_eq!(author.name, None);
    }
}
