//! CSV export of content report groups

use crate::error::{Error, Result};
use crate::report::ReportGroup;
use std::borrow::Cow;
use std::io::Write;

/// CSV header row
pub const CSV_COLUMNS: &[&str] = &["category", "id", "title", "link", "status", "size"];

/// Write one CSV row per item, preceded by the header row
pub fn write_csv<W: Write>(groups: &[ReportGroup], writer: &mut W) -> Result<()> {
    write_row(writer, CSV_COLUMNS.iter().copied())?;

    for group in groups {
        for item in &group.items {
            let id = item.id.map(|id| id.to_string()).unwrap_or_default();
            let size = item.size.map(|s| s.to_string()).unwrap_or_default();
            write_row(
                writer,
                [
                    group.category.as_str(),
                    id.as_str(),
                    item.title.as_str(),
                    item.link.as_str(),
                    item.status.as_str(),
                    size.as_str(),
                ],
            )?;
        }
    }

    writer.flush().map_err(Error::OutputFailed)
}

/// Render groups to an in-memory CSV document
pub fn to_csv_string(groups: &[ReportGroup]) -> Result<String> {
    let mut buffer = Vec::new();
    write_csv(groups, &mut buffer)?;
    // Every field came from a &str
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

fn write_row<'a, W: Write>(writer: &mut W, fields: impl IntoIterator<Item = &'a str>) -> Result<()> {
    let line = fields
        .into_iter()
        .map(escape)
        .collect::<Vec<_>>()
        .join(",");
    // RFC 4180 line terminator
    write!(writer, "{}\r\n", line).map_err(Error::OutputFailed)
}

fn escape(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}
