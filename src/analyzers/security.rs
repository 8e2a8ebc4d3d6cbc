//! Security response headers and certificate lifetime

use super::tls::certificate_days_remaining;
use crate::error::{Error, Result};
use crate::site::{METADATA_TIMEOUT, Site};
use reqwest::header::{
    CONTENT_SECURITY_POLICY, HeaderMap, REFERRER_POLICY, SERVER, SET_COOKIE,
    STRICT_TRANSPORT_SECURITY, X_FRAME_OPTIONS, X_XSS_PROTECTION,
};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SecurityReport {
    pub hsts: bool,
    pub hsts_max_age: Option<String>,
    pub csp: bool,
    /// Number of `Set-Cookie` headers carrying `HttpOnly`
    pub http_only: usize,
    /// Whether any cookie carries `Secure`
    pub cookie_secure: bool,
    pub xfo: String,
    pub xss: String,
    pub referrer_policy: String,
    /// Days until the TLS certificate expires, when it could be read
    pub tls_days: Option<i64>,
    pub server_header: String,
}

fn header_str<'a>(headers: &'a HeaderMap, name: &reqwest::header::HeaderName) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// Inspect response headers; `tls_days` is left unset
pub fn inspect_headers(headers: &HeaderMap) -> SecurityReport {
    let hsts_value = headers.get(STRICT_TRANSPORT_SECURITY);
    let hsts_max_age = hsts_value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            v.split(';')
                .find(|part| part.to_ascii_lowercase().contains("max-age"))
                .and_then(|part| part.split_once('='))
                .map(|(_, age)| age.trim().to_string())
        });

    let cookies: Vec<String> = headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_ascii_lowercase)
        .collect();

    SecurityReport {
        hsts: hsts_value.is_some(),
        hsts_max_age,
        csp: headers.contains_key(CONTENT_SECURITY_POLICY),
        http_only: cookies.iter().filter(|c| c.contains("httponly")).count(),
        cookie_secure: cookies.iter().any(|c| c.contains("secure")),
        xfo: header_str(headers, &X_FRAME_OPTIONS).to_string(),
        xss: header_str(headers, &X_XSS_PROTECTION).to_string(),
        referrer_policy: header_str(headers, &REFERRER_POLICY).to_string(),
        tls_days: None,
        server_header: header_str(headers, &SERVER).to_string(),
    }
}

/// HEAD the homepage, inspect its headers and probe the certificate
pub async fn analyze_security(site: &Site) -> Result<SecurityReport> {
    let response = site
        .head(site.base())
        .timeout(METADATA_TIMEOUT)
        .send()
        .await
        .map_err(Error::transport)?;

    let mut report = inspect_headers(response.headers());
    report.tls_days = certificate_days_remaining(site.domain()).await;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn reads_hardening_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        );
        headers.insert(CONTENT_SECURITY_POLICY, HeaderValue::from_static("default-src 'self'"));
        headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN"));
        headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
        headers.insert(SERVER, HeaderValue::from_static("nginx"));
        headers.append(SET_COOKIE, HeaderValue::from_static("a=1; HttpOnly; Secure"));
        headers.append(SET_COOKIE, HeaderValue::from_static("b=2; Path=/; HttpOnly"));
        headers.append(SET_COOKIE, HeaderValue::from_static("c=3"));

        let report = inspect_headers(&headers);

        assert!(report.hsts);
        assert_eq!(report.hsts_max_age.as_deref(), Some("31536000"));
        assert!(report.csp);
        assert_eq!(report.http_only, 2);
        assert!(report.cookie_secure);
        assert_eq!(report.xfo, "SAMEORIGIN");
        assert_eq!(report.xss, "");
        assert_eq!(report.referrer_policy, "no-referrer");
        assert_eq!(report.server_header, "nginx");
        assert_eq!(report.tls_days, None);
    }

    #[test]
    fn bare_response_has_nothing_set() {
        let report = inspect_headers(&HeaderMap::new());
        assert_eq!(report, SecurityReport::default());
    }

    #[test]
    fn hsts_without_max_age() {
        let mut headers = HeaderMap::new();
        headers.insert(STRICT_TRANSPORT_SECURITY, HeaderValue::from_static("includeSubDomains"));

        let report = inspect_headers(&headers);

        assert!(report.hsts);
        assert_eq!(report.hsts_max_age, None);
    }

    #[tokio::test]
    async fn plain_http_site_has_no_certificate() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200).insert_header("X-Frame-Options", "DENY"))
            .mount(&server)
            .await;
        let site = Site::builder(&server.uri()).allow_private(true).build().await.unwrap();

        let report = analyze_security(&site).await.unwrap();

        assert_eq!(report.xfo, "DENY");
        assert_eq!(report.tls_days, None);
    }
}
