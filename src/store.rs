//! Saved report snapshots
//!
//! Reports are stored as pretty-printed JSON under `<root>/<domain>/<timestamp>.json`.
//! The store treats every report as an opaque blob.

use crate::error::{Error, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const REPORT_EXTENSION: &str = ".json";

/// Same-timestamp saves get a numeric suffix, up to this many
const MAX_NAME_ATTEMPTS: u32 = 100;

/// Listing entry for a saved report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredReport {
    pub filename: String,
    /// Filename without the `.json` extension
    pub timestamp: String,
}

/// File-backed report store rooted at one directory
#[derive(Debug, Clone)]
pub struct ReportStore {
    root: PathBuf,
}

impl ReportStore {
    /// Open the store, creating the root directory if needed
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(Error::Storage)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Saved reports for a domain, newest first
    pub fn list(&self, domain: &str) -> Result<Vec<StoredReport>> {
        let dir = self.domain_dir(domain)?;
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::Storage(e)),
        };

        let mut filenames = Vec::new();
        for entry in entries {
            let entry = entry.map_err(Error::Storage)?;
            if !entry.file_type().map_err(Error::Storage)?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str()
                && name.ends_with(REPORT_EXTENSION)
            {
                filenames.push(name.to_string());
            }
        }
        filenames.sort_unstable_by(|a, b| b.cmp(a));

        Ok(filenames
            .into_iter()
            .map(|filename| StoredReport {
                timestamp: filename.trim_end_matches(REPORT_EXTENSION).to_string(),
                filename,
            })
            .collect())
    }

    /// Persist a report and return its filename
    pub fn save<T: Serialize + ?Sized>(&self, domain: &str, report: &T) -> Result<String> {
        let dir = self.domain_dir(domain)?;
        fs::create_dir_all(&dir).map_err(Error::Storage)?;
        let body = serde_json::to_vec_pretty(report)?;

        let stamp = Utc::now().format("%Y-%m-%dT%H-%M-%S%.6f").to_string();
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let filename = match attempt {
                0 => format!("{}{}", stamp, REPORT_EXTENSION),
                n => format!("{}-{}{}", stamp, n, REPORT_EXTENSION),
            };
            let path = dir.join(&filename);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(&body).map_err(Error::Storage)?;
                    info!(domain, filename = %filename, "report saved");
                    return Ok(filename);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(Error::Storage(e)),
            }
        }
        Err(Error::Storage(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("no free report name for timestamp {}", stamp),
        )))
    }

    /// Read a saved report, `None` if it does not exist
    pub fn load(&self, domain: &str, filename: &str) -> Result<Option<Value>> {
        let path = self.report_path(domain, filename)?;
        let body = match fs::read(&path) {
            Ok(body) => body,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::Storage(e)),
        };
        serde_json::from_slice(&body)
            .map(Some)
            .map_err(|e| Error::Parse(e.to_string()))
    }

    /// Delete a saved report; false if it did not exist
    pub fn delete(&self, domain: &str, filename: &str) -> Result<bool> {
        let path = self.report_path(domain, filename)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(domain, filename, "report deleted");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::Storage(e)),
        }
    }

    fn domain_dir(&self, domain: &str) -> Result<PathBuf> {
        validate_key(domain)?;
        Ok(self.root.join(domain))
    }

    fn report_path(&self, domain: &str, filename: &str) -> Result<PathBuf> {
        validate_key(filename)?;
        Ok(self.domain_dir(domain)?.join(filename))
    }
}

/// Keys must be a single, ordinary path component
fn validate_key(key: &str) -> Result<()> {
    let invalid = key.is_empty()
        || key == "."
        || key == ".."
        || key.contains(['/', '\\', '\0']);
    if invalid {
        return Err(Error::InvalidReportKey(key.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    fn store() -> (tempfile::TempDir, ReportStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::open(dir.path().join("reports")).unwrap();
        (dir, store)
    }

    #[test]
    fn save_list_delete_round_trip() {
        let (_dir, store) = store();
        let report = json!({ "groups": [], "summary": { "pages": 0 } });

        let filename = store.save("example.com", &report).unwrap();
        let listed = store.list("example.com").unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].filename, filename);
        assert_eq!(format!("{}.json", listed[0].timestamp), filename);
        assert!(!filename.contains(':'));

        assert!(store.delete("example.com", &filename).unwrap());
        assert!(store.list("example.com").unwrap().is_empty());
    }

    #[test]
    fn load_returns_saved_blob() {
        let (_dir, store) = store();
        let report = json!({ "summary": { "errors": ["Media error: boom"] } });

        let filename = store.save("example.com", &report).unwrap();

        assert_eq!(store.load("example.com", &filename).unwrap(), Some(report));
        assert_eq!(store.load("example.com", "missing.json").unwrap(), None);
    }

    #[test]
    fn listing_is_newest_first() {
        let (_dir, store) = store();
        let first = store.save("example.com", &json!({ "n": 1 })).unwrap();
        let second = store.save("example.com", &json!({ "n": 2 })).unwrap();

        let names: Vec<String> = store
            .list("example.com")
            .unwrap()
            .into_iter()
            .map(|r| r.filename)
            .collect();

        let mut expected = vec![first, second];
        expected.sort_unstable_by(|a, b| b.cmp(a));
        assert_eq!(names, expected);
    }

    #[test]
    fn unknown_domain_lists_nothing() {
        let (_dir, store) = store();
        assert_ok!(store.list("nobody.example"));
        assert!(store.list("nobody.example").unwrap().is_empty());
    }

    #[test]
    fn delete_missing_report_is_false() {
        let (_dir, store) = store();
        assert!(!store.delete("example.com", "nope.json").unwrap());
    }

    #[test]
    fn path_traversal_is_rejected() {
        let (_dir, store) = store();
        assert_err!(store.list(".."));
        assert_err!(store.delete("example.com", "../../etc/passwd"));
        assert_err!(store.save("a/b", &json!({})));
        assert!(matches!(
            store.load("example.com", ""),
            Err(Error::InvalidReportKey(_))
        ));
    }
}
