//! Target site reference
//!
//! A [`Site`] is the normalized base URL of a WordPress installation, the optional
//! basic-auth credentials to pass through, and the HTTP client every audit uses.

use crate::error::{Error, Result};
use reqwest::{Client, RequestBuilder};
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;
use url::Url;

/// User agent for requests (standard Chrome on Windows)
pub(crate) const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Upper bound for any request without a tighter per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for REST metadata, pagination and HTML page requests
pub const METADATA_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for HEAD probes and the TLS certificate probe
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// WordPress REST API v2 prefix
const WP_API_PATH: &str = "/wp-json/wp/v2";

/// Allowed URL schemes
const ALLOWED_SCHEMES: &[&str] = &["http", "https"];

/// Basic-auth credentials passed through to the target site
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: Option<String>) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// A WordPress site under audit
#[derive(Debug, Clone)]
pub struct Site {
    client: Client,
    url: Url,
    base: String,
    credentials: Option<Credentials>,
    allow_private: bool,
}

/// Builder for configuring a Site with options
#[derive(Debug)]
pub struct SiteBuilder {
    url: String,
    credentials: Option<Credentials>,
    allow_private: bool,
}

impl SiteBuilder {
    /// Create a new builder for the given URL or domain
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            credentials: None,
            allow_private: false,
        }
    }

    /// Pass basic-auth credentials on every request to the site
    ///
    /// An empty username means no credentials.
    pub fn credentials(mut self, username: Option<String>, password: Option<String>) -> Self {
        self.credentials = username
            .filter(|u| !u.is_empty())
            .map(|u| Credentials::new(u, password));
        self
    }

    /// Allow auditing private/internal IP addresses (localhost, 192.168.x.x, etc.)
    ///
    /// By default, SSRF protection blocks requests to internal networks.
    pub fn allow_private(mut self, allow: bool) -> Self {
        self.allow_private = allow;
        self
    }

    /// Build the Site with the configured options
    pub async fn build(self) -> Result<Site> {
        Site::build_internal(&self.url, self.credentials, self.allow_private).await
    }
}

impl Site {
    /// Create a site reference for the given URL or domain, without credentials
    ///
    /// For more options, use [`Site::builder()`].
    pub async fn new(url: &str) -> Result<Self> {
        Self::build_internal(url, None, false).await
    }

    /// Create a builder for configuring site options
    ///
    /// # Example
    ///
    /// ```no_run
    /// use wordpress_content_audit::Site;
    ///
    /// # tokio_test::block_on(async {
    /// let site = Site::builder("localhost:8080")
    ///     .credentials(Some("admin".into()), Some("secret".into()))
    ///     .allow_private(true)
    ///     .build()
    ///     .await?;
    /// # Ok::<(), wordpress_content_audit::Error>(())
    /// # });
    /// ```
    pub fn builder(url: &str) -> SiteBuilder {
        SiteBuilder::new(url)
    }

    async fn build_internal(
        url: &str,
        credentials: Option<Credentials>,
        allow_private: bool,
    ) -> Result<Self> {
        let url = url.trim();
        // Auto-add https:// if no scheme provided
        let url_with_scheme = if !url.contains("://") {
            format!("https://{}", url)
        } else {
            url.to_string()
        };

        let parsed = check_target(&url_with_scheme, allow_private).await?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(DEFAULT_TIMEOUT)
            .danger_accept_invalid_certs(false)
            .build()
            .map_err(|e| Error::HttpClient(e.to_string()))?;

        // Query and fragment never belong to the base
        let mut url = parsed;
        url.set_query(None);
        url.set_fragment(None);
        let base = url.as_str().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            url,
            base,
            credentials,
            allow_private,
        })
    }

    /// Apply the site's SSRF policy to a URL other than the base
    ///
    /// Returns the parsed URL when it may be requested.
    pub async fn check_target(&self, url: &str) -> Result<Url> {
        check_target(url, self.allow_private).await
    }

    /// Validate that the host is not an internal/private address (SSRF protection)
    async fn validate_host(url: &Url) -> Result<()> {
        let host = url
            .host_str()
            .ok_or_else(|| Error::InvalidUrl("missing host".to_string()))?;

        // Block localhost variants
        if host == "localhost" || host.ends_with(".localhost") {
            return Err(Error::InvalidUrl("localhost not allowed".to_string()));
        }

        // Resolve hostname to IP and check if it's internal
        let port = url
            .port()
            .unwrap_or(if url.scheme() == "https" { 443 } else { 80 });
        let socket_addr = format!("{}:{}", host, port);

        if let Ok(addrs) = tokio::net::lookup_host(socket_addr).await {
            for addr in addrs {
                if Self::is_internal_ip(addr.ip()) {
                    return Err(Error::InvalidUrl(format!(
                        "internal/private IP address not allowed: {}",
                        addr.ip()
                    )));
                }
            }
        }

        Ok(())
    }

    /// Check if an IP address is internal/private (RFC 1918, link-local, loopback, etc.)
    fn is_internal_ip(ip: IpAddr) -> bool {
        match ip {
            IpAddr::V4(ipv4) => {
                ipv4.is_loopback()                      // 127.0.0.0/8
                    || ipv4.is_private()                // 10.0.0.0/8, 172.16.0.0/12, 192.168.0.0/16
                    || ipv4.is_link_local()             // 169.254.0.0/16
                    || ipv4.is_broadcast()              // 255.255.255.255
                    || ipv4.is_unspecified()            // 0.0.0.0
                    || ipv4.octets()[0] == 100          // Shared address space 100.64.0.0/10
                        && ipv4.octets()[1] >= 64
                        && ipv4.octets()[1] <= 127
                    || ipv4.octets()[..2] == [192, 0] // Documentation/test ranges
            }
            IpAddr::V6(ipv6) => {
                ipv6.is_loopback()                      // ::1
                    || ipv6.is_unspecified()            // ::
                    // Unique local addresses (fc00::/7)
                    || (ipv6.segments()[0] & 0xfe00) == 0xfc00
                    // Link-local (fe80::/10)
                    || (ipv6.segments()[0] & 0xffc0) == 0xfe80
            }
        }
    }

    /// Base URL without trailing slash, e.g. `https://example.com/blog`
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Parsed base URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn allow_private(&self) -> bool {
        self.allow_private
    }

    /// Host part of the base URL, used as the report store key
    pub fn domain(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// REST API v2 route, e.g. `api_endpoint("pages")`
    pub fn api_endpoint(&self, route: &str) -> String {
        format!("{}{}/{}", self.base, WP_API_PATH, route)
    }

    /// Front-end link for a path fragment, always with a trailing slash
    pub fn link(&self, fragment: &str) -> String {
        format!("{}/{}/", self.base, fragment)
    }

    /// GET request, carrying the site's credentials when `url` is on the site's origin
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.authorize(self.client.get(url), url)
    }

    /// HEAD request, carrying the site's credentials when `url` is on the site's origin
    pub fn head(&self, url: &str) -> RequestBuilder {
        self.authorize(self.client.head(url), url)
    }

    fn authorize(&self, request: RequestBuilder, url: &str) -> RequestBuilder {
        match &self.credentials {
            Some(creds) if self.same_origin(url) => {
                request.basic_auth(&creds.username, creds.password.as_deref())
            }
            _ => request,
        }
    }

    fn same_origin(&self, url: &str) -> bool {
        Url::parse(url).is_ok_and(|u| u.origin() == self.url.origin())
    }
}

/// Parse `url` and reject non-HTTP schemes and, unless `allow_private`, internal hosts
pub async fn check_target(url: &str, allow_private: bool) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|e| Error::InvalidUrl(e.to_string()))?;

    // Validate URL scheme (SSRF protection)
    if !ALLOWED_SCHEMES.contains(&parsed.scheme()) {
        return Err(Error::InvalidUrl(format!(
            "scheme '{}' not allowed (use http or https)",
            parsed.scheme()
        )));
    }

    if !allow_private {
        Site::validate_host(&parsed).await?;
    }
    Ok(parsed)
}
