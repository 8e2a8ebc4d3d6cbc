//! Theme and plugin fingerprinting from asset URLs

use super::{fetch_html, select};
use crate::site::Site;
use regex::Regex;
use scraper::Html;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Plugin slugs to skip (not real plugins, just directory names)
const SKIP_PLUGIN_SLUGS: &[&str] = &["index", "cache"];

static THEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/wp-content/themes/([^/]+)/").expect("valid theme pattern"));

static PLUGIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/wp-content/(?:mu-)?plugins/([a-zA-Z0-9_-]+)/").expect("valid plugin pattern")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectedComponent {
    pub slug: String,
    /// Version from the asset's `ver=` query parameter, if any
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ThemePluginReport {
    pub themes: Vec<DetectedComponent>,
    pub plugins: Vec<DetectedComponent>,
}

/// Accumulates slugs and versions across pages
#[derive(Debug, Default)]
pub struct Fingerprints {
    themes: BTreeMap<String, Option<String>>,
    plugins: BTreeMap<String, Option<String>>,
}

impl Fingerprints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every theme and plugin referenced by `link` and `script` assets
    pub fn scan_html(&mut self, html: &str) {
        let document = Html::parse_document(html);
        let sources = select(&document, "link[href]")
            .into_iter()
            .filter_map(|l| l.value().attr("href"))
            .chain(
                select(&document, "script[src]")
                    .into_iter()
                    .filter_map(|s| s.value().attr("src")),
            );

        for url in sources {
            if let Some(caps) = THEME_RE.captures(url) {
                record(&mut self.themes, &caps[1], url);
            }
            if let Some(caps) = PLUGIN_RE.captures(url)
                && !SKIP_PLUGIN_SLUGS.contains(&&caps[1])
            {
                record(&mut self.plugins, &caps[1], url);
            }
        }
    }

    /// Sorted report of everything seen so far
    pub fn finish(self) -> ThemePluginReport {
        let collect = |map: BTreeMap<String, Option<String>>| {
            map.into_iter()
                .map(|(slug, version)| DetectedComponent { slug, version })
                .collect()
        };
        ThemePluginReport {
            themes: collect(self.themes),
            plugins: collect(self.plugins),
        }
    }
}

/// First known version wins; a later versioned sighting fills a gap
fn record(map: &mut BTreeMap<String, Option<String>>, slug: &str, url: &str) {
    let version = version_from_url(url);
    let entry = map.entry(slug.to_string()).or_default();
    if entry.is_none() {
        *entry = version;
    }
}

/// Extract the `ver=` query parameter from an asset URL
fn version_from_url(url: &str) -> Option<String> {
    let query = url.split_once('?')?.1;
    let v_start = query.find("ver=")? + 4;
    let rest = &query[v_start..];
    let v_end = rest
        .find(|c: char| !c.is_ascii_alphanumeric() && c != '.' && c != '-' && c != '_')
        .unwrap_or(rest.len());
    let raw = &rest[..v_end];
    if raw.is_empty() {
        return None;
    }
    Some(normalize_version(raw))
}

/// Normalize version string - detect timestamps and hashes
pub fn normalize_version(version: &str) -> String {
    // Unix timestamp: 10 digits starting with 1 or 2
    if version.len() == 10
        && version.chars().all(|c| c.is_ascii_digit())
        && version.starts_with(['1', '2'])
    {
        return format!("(timestamp:{})", version);
    }

    // Commit hash or 7+ char abbreviation
    if version.len() >= 7
        && version.chars().all(|c| c.is_ascii_hexdigit())
        && !version.chars().all(|c| c.is_ascii_digit())
    {
        return format!("(hash:{})", &version[..7]);
    }

    version.to_string()
}

/// Fingerprint the given pages, or the homepage when none are given
///
/// Pages the site's SSRF policy rejects, and pages that fail to load, are skipped.
pub async fn analyze_theme_plugin(site: &Site, urls: &[String]) -> ThemePluginReport {
    let mut fingerprints = Fingerprints::new();

    if urls.is_empty() {
        scan_page(site, site.base(), &mut fingerprints).await;
    }
    for url in urls {
        match site.check_target(url).await {
            Ok(_) => scan_page(site, url, &mut fingerprints).await,
            Err(e) => warn!(url = %url, error = %e, "page rejected"),
        }
    }

    fingerprints.finish()
}

async fn scan_page(site: &Site, url: &str, fingerprints: &mut Fingerprints) {
    match fetch_html(site, url).await {
        Ok(html) => fingerprints.scan_html(&html),
        Err(e) => debug!(url, error = %e, "skipping page"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const HOME: &str = r#"<html><head>
<link rel="stylesheet" href="https://x/wp-content/themes/astra/style.css?ver=4.6.1">
<link rel="stylesheet" href="https://x/wp-content/plugins/elementor/assets/css/frontend.min.css?ver=1748271784">
<script src="https://x/wp-content/plugins/contact-form-7/includes/js/index.js"></script>
<script src="https://x/wp-content/mu-plugins/cache/loader.js"></script>
</head><body>
<a href="https://x/wp-content/plugins/hidden-in-anchor/readme.txt">not an asset</a>
</body></html>"#;

    #[test]
    fn detects_from_link_and_script_assets() {
        let mut fingerprints = Fingerprints::new();
        fingerprints.scan_html(HOME);
        let report = fingerprints.finish();

        assert_eq!(
            report.themes,
            vec![DetectedComponent {
                slug: "astra".into(),
                version: Some("4.6.1".into())
            }]
        );
        let slugs: Vec<&str> = report.plugins.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["contact-form-7", "elementor"]);
        assert_eq!(
            report.plugins[1].version.as_deref(),
            Some("(timestamp:1748271784)")
        );
        assert_eq!(report.plugins[0].version, None);
    }

    #[test]
    fn later_page_fills_missing_version() {
        let mut fingerprints = Fingerprints::new();
        fingerprints.scan_html(r#"<script src="/wp-content/plugins/woo/a.js"></script>"#);
        fingerprints.scan_html(r#"<script src="/wp-content/plugins/woo/b.js?ver=8.1"></script>"#);
        fingerprints.scan_html(r#"<script src="/wp-content/plugins/woo/c.js?ver=9.0"></script>"#);

        let report = fingerprints.finish();

        assert_eq!(report.plugins.len(), 1);
        assert_eq!(report.plugins[0].version.as_deref(), Some("8.1"));
    }

    #[test]
    fn normalize_semantic_version() {
        assert_eq!(normalize_version("1.2.3"), "1.2.3");
        assert_eq!(normalize_version("22.0.0"), "22.0.0");
        assert_eq!(normalize_version("7.0-alpha"), "7.0-alpha");
    }

    #[test]
    fn normalize_timestamp_version() {
        assert_eq!(normalize_version("1748271784"), "(timestamp:1748271784)");
    }

    #[test]
    fn normalize_hash_version() {
        assert_eq!(
            normalize_version("569ab5664387d06c16a234c9771d3d57fb15720a"),
            "(hash:569ab56)"
        );
        assert_eq!(normalize_version("abcdef1"), "(hash:abcdef1)");
    }

    #[test]
    fn normalize_date_version() {
        assert_eq!(normalize_version("20200121"), "20200121");
    }

    #[tokio::test]
    async fn scans_homepage_without_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(HOME))
            .expect(1)
            .mount(&server)
            .await;
        let site = Site::builder(&server.uri()).allow_private(true).build().await.unwrap();

        let report = analyze_theme_plugin(&site, &[]).await;

        assert_eq!(report.themes.len(), 1);
        assert_eq!(report.plugins.len(), 2);
    }

    #[tokio::test]
    async fn scans_only_the_given_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(HOME))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/shop/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<script src="/wp-content/plugins/woocommerce/x.js?ver=8.5.2"></script>"#,
            ))
            .mount(&server)
            .await;
        let site = Site::builder(&server.uri()).allow_private(true).build().await.unwrap();
        let extra = vec![
            format!("{}/shop/", server.uri()),
            format!("{}/missing/", server.uri()),
        ];

        let report = analyze_theme_plugin(&site, &extra).await;

        assert!(report.themes.is_empty());
        let slugs: Vec<&str> = report.plugins.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["woocommerce"]);
    }

    #[tokio::test]
    async fn internal_pages_are_not_fetched_for_a_public_site() {
        let internal = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(HOME))
            .expect(0)
            .mount(&internal)
            .await;
        let site = Site::builder("http://8.8.8.8:9")
            .credentials(Some("admin".into()), Some("secret".into()))
            .build()
            .await
            .unwrap();

        let report = analyze_theme_plugin(&site, &[format!("{}/admin", internal.uri())]).await;

        assert!(report.themes.is_empty());
        assert!(report.plugins.is_empty());
    }
}
