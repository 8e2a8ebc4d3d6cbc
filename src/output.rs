//! Output formatting for audit results

use crate::analyzers::accessibility::AccessibilityReport;
use crate::analyzers::performance::PerformanceReport;
use crate::analyzers::security::SecurityReport;
use crate::analyzers::seo::SeoEntry;
use crate::analyzers::theme_plugin::{DetectedComponent, ThemePluginReport};
use crate::analyzers::users::UserEntry;
use crate::error::{Error, Result};
use crate::report::ContentReport;
use crate::store::StoredReport;
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ContentArrangement, Table, presets::UTF8_FULL,
};
use serde::Serialize;
use std::io::Write;
use std::str::FromStr;

/// Output format for results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable table output
    #[default]
    Human,
    /// JSON output
    Json,
    /// No output (silent mode)
    None,
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            "none" => Ok(Self::None),
            _ => Err(Error::InvalidOutputFormat(s.to_string())),
        }
    }
}

/// Results that can be shown as tables
pub trait Render {
    fn tables(&self) -> Vec<Table>;
}

/// Output a result in the requested format
pub fn output_report<T, W>(report: &T, format: OutputFormat, writer: &mut W) -> Result<()>
where
    T: Render + Serialize + ?Sized,
    W: Write,
{
    match format {
        OutputFormat::Human => output_human(report, writer),
        OutputFormat::Json => output_json(report, writer),
        OutputFormat::None => Ok(()),
    }
}

/// Output JSON format
pub fn output_json<T: Serialize + ?Sized, W: Write>(report: &T, writer: &mut W) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, report)?;
    writeln!(writer).map_err(Error::OutputFailed)?;
    Ok(())
}

fn output_human<T: Render + ?Sized, W: Write>(report: &T, writer: &mut W) -> Result<()> {
    for table in report.tables() {
        writeln!(writer, "{}", table).map_err(Error::OutputFailed)?;
    }
    Ok(())
}

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        );
    table
}

fn flag_cell(present: bool) -> Cell {
    let (text, color) = if present {
        ("Yes", Color::Green)
    } else {
        ("No", Color::Red)
    };
    Cell::new(text).fg(color).set_alignment(CellAlignment::Center)
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}

impl Render for ContentReport {
    fn tables(&self) -> Vec<Table> {
        let mut tables = Vec::new();

        let mut summary = new_table(&["Group", "Items"]);
        summary.add_row(vec![Cell::new("Pages"), Cell::new(self.summary.pages)]);
        summary.add_row(vec![Cell::new("Posts"), Cell::new(self.summary.posts)]);
        for (key, count) in &self.summary.cpts {
            summary.add_row(vec![Cell::new(format!("CPT {}", key)), Cell::new(count)]);
        }
        summary.add_row(vec![Cell::new("Media"), Cell::new(self.summary.media)]);
        summary.add_row(vec![Cell::new("Archives"), Cell::new(self.summary.archives)]);
        tables.push(summary);

        for group in &self.groups {
            let mut table = new_table(&[group.category.as_str(), "ID", "Status", "Size", "Link"]);
            for item in &group.items {
                table.add_row(vec![
                    Cell::new(or_dash(&item.title)),
                    Cell::new(item.id.map(|id| id.to_string()).unwrap_or_else(|| "-".into())),
                    Cell::new(&item.status),
                    Cell::new(item.size.map(|s| s.to_string()).unwrap_or_else(|| "-".into()))
                        .set_alignment(CellAlignment::Right),
                    Cell::new(&item.link),
                ]);
            }
            tables.push(table);
        }

        if !self.summary.errors.is_empty() {
            let mut errors = new_table(&["Errors"]);
            for error in &self.summary.errors {
                errors.add_row(vec![Cell::new(error).fg(Color::Yellow)]);
            }
            tables.push(errors);
        }

        tables
    }
}

impl Render for [SeoEntry] {
    fn tables(&self) -> Vec<Table> {
        let mut table = new_table(&["Title", "Score", "Title Tag", "Description", "H1", "Link"]);
        for entry in self {
            let score = entry.metrics.score;
            let color = match score {
                80.. => Color::Green,
                50.. => Color::Yellow,
                _ => Color::Red,
            };
            table.add_row(vec![
                Cell::new(or_dash(&entry.title)),
                Cell::new(score).fg(color).set_alignment(CellAlignment::Center),
                Cell::new(or_dash(&entry.metrics.title_tag)),
                Cell::new(entry.metrics.meta_desc.chars().count())
                    .set_alignment(CellAlignment::Right),
                Cell::new(entry.metrics.headings.get("h1").copied().unwrap_or(0))
                    .set_alignment(CellAlignment::Right),
                Cell::new(&entry.link),
            ]);
        }
        vec![table]
    }
}

impl Render for AccessibilityReport {
    fn tables(&self) -> Vec<Table> {
        let mut table = new_table(&["Check", "Result"]);
        table.add_row(vec![Cell::new("Images"), Cell::new(self.total_images)]);
        table.add_row(vec![
            Cell::new("Images without alt"),
            Cell::new(self.missing_alt).fg(count_color(self.missing_alt)),
        ]);
        table.add_row(vec![
            Cell::new("Unlabelled form fields"),
            Cell::new(self.missing_labels).fg(count_color(self.missing_labels)),
        ]);
        table.add_row(vec![
            Cell::new("Links without text"),
            Cell::new(self.empty_links).fg(count_color(self.empty_links)),
        ]);
        table.add_row(vec![Cell::new("Skip links"), Cell::new(self.skip_links)]);
        table.add_row(vec![Cell::new("Landmarks"), Cell::new(self.landmarks)]);
        for (tag, count) in &self.headings {
            table.add_row(vec![Cell::new(format!("Heading <{}>", tag)), Cell::new(count)]);
        }
        vec![table]
    }
}

fn count_color(problems: usize) -> Color {
    if problems == 0 { Color::Green } else { Color::Yellow }
}

impl Render for SecurityReport {
    fn tables(&self) -> Vec<Table> {
        let mut table = new_table(&["Header", "Value"]);
        table.add_row(vec![Cell::new("Strict-Transport-Security"), flag_cell(self.hsts)]);
        table.add_row(vec![
            Cell::new("HSTS max-age"),
            Cell::new(self.hsts_max_age.as_deref().unwrap_or("-")),
        ]);
        table.add_row(vec![Cell::new("Content-Security-Policy"), flag_cell(self.csp)]);
        table.add_row(vec![Cell::new("HttpOnly cookies"), Cell::new(self.http_only)]);
        table.add_row(vec![Cell::new("Secure cookies"), flag_cell(self.cookie_secure)]);
        table.add_row(vec![Cell::new("X-Frame-Options"), Cell::new(or_dash(&self.xfo))]);
        table.add_row(vec![Cell::new("X-XSS-Protection"), Cell::new(or_dash(&self.xss))]);
        table.add_row(vec![
            Cell::new("Referrer-Policy"),
            Cell::new(or_dash(&self.referrer_policy)),
        ]);
        table.add_row(vec![Cell::new("Server"), Cell::new(or_dash(&self.server_header))]);
        let tls = match self.tls_days {
            Some(days) if days < 0 => Cell::new(format!("expired {} days ago", -days)).fg(Color::Red),
            Some(days) if days < 30 => Cell::new(format!("{} days", days)).fg(Color::Yellow),
            Some(days) => Cell::new(format!("{} days", days)).fg(Color::Green),
            None => Cell::new("Unknown").fg(Color::DarkGrey),
        };
        table.add_row(vec![Cell::new("Certificate expires in"), tls]);
        vec![table]
    }
}

impl Render for ThemePluginReport {
    fn tables(&self) -> Vec<Table> {
        let mut table = new_table(&["Type", "Name", "Version"]);
        let mut add = |kind: &str, components: &[DetectedComponent]| {
            if components.is_empty() {
                table.add_row(vec![
                    Cell::new(kind),
                    Cell::new("-"),
                    Cell::new("Not Found").fg(Color::DarkGrey),
                ]);
            }
            for component in components {
                table.add_row(vec![
                    Cell::new(kind),
                    Cell::new(&component.slug),
                    Cell::new(component.version.as_deref().unwrap_or("Unknown")),
                ]);
            }
        };
        add("Theme", &self.themes);
        add("Plugin", &self.plugins);
        vec![table]
    }
}

impl Render for [UserEntry] {
    fn tables(&self) -> Vec<Table> {
        let mut table = new_table(&["ID", "Name", "Link"]);
        for user in self {
            table.add_row(vec![Cell::new(user.id), Cell::new(&user.name), Cell::new(&user.link)]);
        }
        vec![table]
    }
}

impl Render for PerformanceReport {
    fn tables(&self) -> Vec<Table> {
        let status_color = if self.status_code < 400 {
            Color::Green
        } else {
            Color::Red
        };
        let mut table = new_table(&["Metric", "Value"]);
        table.add_row(vec![
            Cell::new("Status"),
            Cell::new(self.status_code).fg(status_color),
        ]);
        table.add_row(vec![
            Cell::new("Response time"),
            Cell::new(format!("{} ms", self.response_time_ms)),
        ]);
        table.add_row(vec![
            Cell::new("Content length"),
            Cell::new(format!("{} bytes", self.content_length)),
        ]);
        vec![table]
    }
}

/// Broken link list
impl Render for [String] {
    fn tables(&self) -> Vec<Table> {
        let mut table = new_table(&["Broken Link"]);
        if self.is_empty() {
            table.add_row(vec![Cell::new("None").fg(Color::Green)]);
        }
        for link in self {
            table.add_row(vec![Cell::new(link).fg(Color::Red)]);
        }
        vec![table]
    }
}

impl Render for [StoredReport] {
    fn tables(&self) -> Vec<Table> {
        let mut table = new_table(&["Saved Report", "Timestamp"]);
        for report in self {
            table.add_row(vec![Cell::new(&report.filename), Cell::new(&report.timestamp)]);
        }
        vec![table]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ReportGroup, ReportItem, Summary};

    fn render<T: Render + Serialize + ?Sized>(report: &T, format: OutputFormat) -> String {
        let mut buffer = Vec::new();
        output_report(report, format, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    fn content_report() -> ContentReport {
        ContentReport {
            groups: vec![ReportGroup::new(
                "Pages",
                vec![ReportItem {
                    id: Some(1),
                    title: "Home".into(),
                    link: "https://example.com/".into(),
                    status: "publish".into(),
                    size: None,
                }],
            )],
            summary: Summary {
                pages: 1,
                errors: vec!["Media error: HTTP error: status 500".into()],
                ..Default::default()
            },
        }
    }

    #[test]
    fn parse_output_format() {
        assert_eq!("human".parse::<OutputFormat>().unwrap(), OutputFormat::Human);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("none".parse::<OutputFormat>().unwrap(), OutputFormat::None);
        assert!(matches!(
            "xml".parse::<OutputFormat>(),
            Err(Error::InvalidOutputFormat(_))
        ));
    }

    #[test]
    fn human_output_lists_items_and_errors() {
        let text = render(&content_report(), OutputFormat::Human);

        assert!(text.contains("Home"));
        assert!(text.contains("https://example.com/"));
        assert!(text.contains("Media error"));
    }

    #[test]
    fn json_output_is_the_report_shape() {
        let text = render(&content_report(), OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["groups"][0]["category"], "Pages");
        assert_eq!(value["summary"]["pages"], 1);
    }

    #[test]
    fn none_format_writes_nothing() {
        assert!(render(&content_report(), OutputFormat::None).is_empty());
    }

    #[test]
    fn empty_broken_list_says_none() {
        let links: Vec<String> = Vec::new();
        assert!(render(links.as_slice(), OutputFormat::Human).contains("None"));
    }
}
