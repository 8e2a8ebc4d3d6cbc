//! Paginated access to WordPress REST collections

use crate::error::{Error, Result};
use crate::site::{METADATA_TIMEOUT, Site};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Items requested per page (the REST API maximum)
pub const PER_PAGE: u32 = 100;

/// Response header carrying the total page count of a collection
pub const TOTAL_PAGES_HEADER: &str = "X-WP-TotalPages";

/// Fetch every page of a REST collection and return the concatenated items.
///
/// `params` are sent with every page request alongside `per_page` and `page`.
/// Pagination stops on an empty page or once `page` reaches the
/// `X-WP-TotalPages` header. A missing or non-numeric header counts as zero,
/// so only the first page is read. Any failure aborts the whole collection.
pub async fn fetch_all<T: DeserializeOwned>(
    site: &Site,
    endpoint: &str,
    params: &[(&str, &str)],
) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut page: u32 = 1;

    loop {
        let request = site
            .get(endpoint)
            .query(params)
            .query(&[("per_page", PER_PAGE), ("page", page)])
            .timeout(METADATA_TIMEOUT);
        let response = send_checked(request).await?;
        let total_pages = total_pages(&response);
        let batch: Vec<T> = decode(response).await?;

        debug!(endpoint, page, total_pages, count = batch.len(), "fetched page");

        if batch.is_empty() {
            break;
        }
        items.extend(batch);
        if page >= total_pages {
            break;
        }
        page += 1;
    }

    Ok(items)
}

/// GET a single JSON document from the site
pub async fn fetch_json<T: DeserializeOwned>(site: &Site, url: &str) -> Result<T> {
    let response = send_checked(site.get(url).timeout(METADATA_TIMEOUT)).await?;
    decode(response).await
}

/// Send a request, mapping transport failures and non-2xx statuses to errors
pub(crate) async fn send_checked(request: RequestBuilder) -> Result<Response> {
    let response = request.send().await.map_err(Error::transport)?;

    if !response.status().is_success() {
        return Err(Error::HttpStatus(response.status().as_u16()));
    }

    Ok(response)
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = response.bytes().await.map_err(Error::transport)?;
    serde_json::from_slice(&body).map_err(|e| Error::Parse(e.to_string()))
}

fn total_pages(response: &Response) -> u32 {
    response
        .headers()
        .get(TOTAL_PAGES_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0)
}
