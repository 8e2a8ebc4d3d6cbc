//! Synthetic archive pages
//!
//! The REST API has no endpoint for category, tag, author or date archives, so
//! they are derived from the taxonomy, user and post collections.

use crate::records::{Author, ContentRecord, TaxonomyTerm};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// Status marker carried by every archive descriptor
pub const ARCHIVE_STATUS: &str = "archive";

/// Kind of listing page an archive descriptor stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveKind {
    Category,
    Tag,
    Author,
    Monthly,
    Yearly,
}

impl std::fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Category => write!(f, "Categoria"),
            Self::Tag => write!(f, "Tag"),
            Self::Author => write!(f, "Autore"),
            Self::Monthly => write!(f, "Archivio Mensile"),
            Self::Yearly => write!(f, "Archivio Annuale"),
        }
    }
}

/// A derived archive page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveDescriptor {
    pub kind: ArchiveKind,
    /// Human label, e.g. `Categoria: News`
    pub label: String,
    pub link: String,
}

impl ArchiveDescriptor {
    fn new(kind: ArchiveKind, name: &str, link: String) -> Self {
        Self {
            kind,
            label: format!("{}: {}", kind, name),
            link,
        }
    }

    pub fn status(&self) -> &'static str {
        ARCHIVE_STATUS
    }
}

/// Insertion-ordered set of descriptors keyed by link.
///
/// Inserting a link that is already present replaces the stored descriptor
/// but keeps its original position.
#[derive(Debug, Clone, Default)]
pub struct ArchiveSet {
    entries: Vec<ArchiveDescriptor>,
    positions: HashMap<String, usize>,
}

impl ArchiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite by link; returns true if the link was new
    pub fn insert(&mut self, descriptor: ArchiveDescriptor) -> bool {
        match self.positions.get(&descriptor.link) {
            Some(&index) => {
                self.entries[index] = descriptor;
                false
            }
            None => {
                self.positions
                    .insert(descriptor.link.clone(), self.entries.len());
                self.entries.push(descriptor);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArchiveDescriptor> {
        self.entries.iter()
    }

    pub fn into_vec(self) -> Vec<ArchiveDescriptor> {
        self.entries
    }
}

/// Derive archive descriptors from taxonomy terms, users and posts.
///
/// `base` is the site base URL without trailing slash. Output order is
/// categories, tags and authors in source order, then months and years
/// ascending. Posts without a date contribute no date archives.
pub fn synthesize_archives(
    base: &str,
    categories: &[TaxonomyTerm],
    tags: &[TaxonomyTerm],
    authors: &[Author],
    posts: &[ContentRecord],
) -> ArchiveSet {
    let mut set = ArchiveSet::new();

    for category in categories {
        let link = format!("{}/category/{}/", base, or_empty(&category.slug));
        set.insert(ArchiveDescriptor::new(ArchiveKind::Category, or_empty(&category.name), link));
    }
    for tag in tags {
        let link = format!("{}/tag/{}/", base, or_empty(&tag.slug));
        set.insert(ArchiveDescriptor::new(ArchiveKind::Tag, or_empty(&tag.name), link));
    }
    for author in authors {
        let link = format!("{}/author/{}/", base, or_empty(&author.slug));
        set.insert(ArchiveDescriptor::new(ArchiveKind::Author, or_empty(&author.name), link));
    }

    let days: BTreeSet<&str> = posts
        .iter()
        .filter_map(|p| p.date.as_deref())
        .filter(|d| !d.is_empty())
        .map(|d| d.split('T').next().unwrap_or(d))
        .collect();
    let months: BTreeSet<&str> = days.iter().copied().map(|d| d.get(..7).unwrap_or(d)).collect();
    let years: BTreeSet<&str> = days
        .iter()
        .copied()
        .map(|d| d.split('-').next().unwrap_or(d))
        .collect();

    for month in months {
        set.insert(ArchiveDescriptor::new(
            ArchiveKind::Monthly,
            month,
            format!("{}/{}/", base, month),
        ));
    }
    for year in years {
        set.insert(ArchiveDescriptor::new(
            ArchiveKind::Yearly,
            year,
            format!("{}/{}/", base, year),
        ));
    }

    set
}

fn or_empty(field: &Option<String>) -> &str {
    field.as_deref().unwrap_or_default()
}
