//! Homepage response timing

use crate::error::{Error, Result};
use crate::site::{DEFAULT_TIMEOUT, Site};
use reqwest::header::CONTENT_LENGTH;
use serde::Serialize;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PerformanceReport {
    pub status_code: u16,
    /// Time until response headers arrived
    pub response_time_ms: u64,
    /// `Content-Length` header, or the body size when absent
    pub content_length: u64,
}

/// GET the homepage once and time it
pub async fn measure_performance(site: &Site) -> Result<PerformanceReport> {
    let started = Instant::now();
    let response = site
        .get(site.base())
        .timeout(DEFAULT_TIMEOUT)
        .send()
        .await
        .map_err(Error::transport)?;
    let response_time_ms = started.elapsed().as_millis() as u64;
    let status_code = response.status().as_u16();

    let declared = response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    let content_length = match declared {
        Some(length) => length,
        None => response.bytes().await.map_err(Error::transport)?.len() as u64,
    };

    Ok(PerformanceReport {
        status_code,
        response_time_ms,
        content_length,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn reports_status_and_size() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(1500)))
            .mount(&server)
            .await;
        let site = Site::builder(&server.uri()).allow_private(true).build().await.unwrap();

        let report = measure_performance(&site).await.unwrap();

        assert_eq!(report.status_code, 200);
        assert_eq!(report.content_length, 1500);
        assert!(report.response_time_ms < DEFAULT_TIMEOUT.as_millis() as u64);
    }

    #[tokio::test]
    async fn error_status_is_still_measured() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let site = Site::builder(&server.uri()).allow_private(true).build().await.unwrap();

        let report = measure_performance(&site).await.unwrap();

        assert_eq!(report.status_code, 503);
        assert_eq!(report.content_length, 0);
    }

    #[tokio::test]
    async fn unreachable_site_is_an_error() {
        let site = Site::builder("http://127.0.0.1:9").allow_private(true).build().await.unwrap();

        assert!(matches!(
            measure_performance(&site).await,
            Err(Error::Transport(_))
        ));
    }
}
