//! Author enumeration through the public users endpoint

use crate::error::Result;
use crate::fetch::fetch_all;
use crate::records::Author;
use crate::site::Site;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserEntry {
    pub id: u64,
    pub name: String,
    pub link: String,
}

/// Every user the REST API exposes, with their author archive link
pub async fn enumerate_users(site: &Site) -> Result<Vec<UserEntry>> {
    let authors: Vec<Author> = fetch_all(site, &site.api_endpoint("users"), &[]).await?;
    Ok(authors
        .into_iter()
        .map(|author| UserEntry {
            id: author.id,
            link: site.link(&format!("author/{}", author.slug.unwrap_or_default())),
            name: author.name.unwrap_or_default(),
        })
        .collect())
}
