//! Dead link detection over a content report's items

use crate::content::STAGE_CONCURRENCY;
use crate::error::{Error, Result};
use crate::report::ReportGroup;
use crate::site::{PROBE_TIMEOUT, USER_AGENT, check_target};
use futures::future;
use futures::stream::{self, StreamExt};
use reqwest::{Client, redirect};
use std::collections::BTreeSet;
use tracing::debug;
use url::Url;

/// HEAD-probes links without following redirects
///
/// Unless `allow_private` is set, links to internal hosts are skipped and never requested.
#[derive(Debug, Clone)]
pub struct LinkChecker {
    client: Client,
    allow_private: bool,
}

impl LinkChecker {
    pub fn new(allow_private: bool) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(PROBE_TIMEOUT)
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| Error::HttpClient(e.to_string()))?;
        Ok(Self {
            client,
            allow_private,
        })
    }

    /// Whether a link answers with status >= 400 or not at all
    pub async fn is_broken(&self, link: &str) -> bool {
        match self.client.head(link).send().await {
            Ok(response) => response.status().as_u16() >= 400,
            Err(e) => {
                debug!(link, error = %e, "link unreachable");
                true
            }
        }
    }

    /// Sorted, de-duplicated broken links across every group's items
    pub async fn find_broken(&self, groups: &[ReportGroup]) -> Vec<String> {
        let links: BTreeSet<String> = groups
            .iter()
            .flat_map(|g| g.items.iter())
            .filter(|item| !item.link.is_empty())
            .map(|item| item.link.clone())
            .collect();

        let broken: BTreeSet<String> = stream::iter(links)
            .map(|link| self.check(link))
            .buffer_unordered(STAGE_CONCURRENCY)
            .filter_map(future::ready)
            .collect()
            .await;

        broken.into_iter().collect()
    }

    async fn check(&self, link: String) -> Option<String> {
        // Unparseable links fall through and count as unreachable
        if Url::parse(&link).is_ok()
            && let Err(e) = check_target(&link, self.allow_private).await
        {
            debug!(link, error = %e, "link skipped");
            return None;
        }
        self.is_broken(&link).await.then_some(link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ReportItem;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn item(link: String) -> ReportItem {
        ReportItem {
            id: Some(1),
            title: "t".into(),
            link,
            status: "publish".into(),
            size: None,
        }
    }

    #[tokio::test]
    async fn flags_error_statuses_and_dead_hosts() {
        let server = MockServer::start().await;
        let uri = server.uri();
        Mock::given(method("HEAD"))
            .and(path("/ok/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/moved/"))
            .respond_with(ResponseTemplate::new(301).insert_header("Location", "/gone/"))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/gone/"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        let groups = vec![
            ReportGroup::new(
                "Pages",
                vec![
                    item(format!("{}/ok/", uri)),
                    item(format!("{}/gone/", uri)),
                    item(format!("{}/moved/", uri)),
                ],
            ),
            ReportGroup::new(
                "Posts",
                vec![
                    item(format!("{}/gone/", uri)),
                    item("http://127.0.0.1:9/dead".into()),
                    item(String::new()),
                ],
            ),
        ];

        let broken = LinkChecker::new(true).unwrap().find_broken(&groups).await;

        let mut expected = vec!["http://127.0.0.1:9/dead".to_string(), format!("{}/gone/", uri)];
        expected.sort();
        assert_eq!(broken, expected);
    }

    #[tokio::test]
    async fn internal_links_are_skipped_when_private_targets_are_disallowed() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(404))
            .expect(0)
            .mount(&server)
            .await;
        let groups = vec![ReportGroup::new(
            "Pages",
            vec![
                item(format!("{}/admin/", server.uri())),
                item("http://10.0.0.1/dead".into()),
            ],
        )];

        let broken = LinkChecker::new(false).unwrap().find_broken(&groups).await;

        assert!(broken.is_empty());
    }

    #[tokio::test]
    async fn nothing_to_check() {
        let broken = LinkChecker::new(false).unwrap().find_broken(&[]).await;
        assert!(broken.is_empty());
    }
}
