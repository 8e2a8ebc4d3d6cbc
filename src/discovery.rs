//! Discovery of publicly viewable custom post types

use crate::error::Result;
use crate::fetch::fetch_json;
use crate::site::Site;
use serde_json::{Map, Value};

/// Built-in types with dedicated report groups
const BUILTIN_TYPES: &[&str] = &["post", "page"];

/// Query the type registry and return the keys of public custom types,
/// in registry order.
pub async fn discover_public_types(site: &Site) -> Result<Vec<String>> {
    let registry: Map<String, Value> = fetch_json(site, &site.api_endpoint("types")).await?;
    Ok(public_type_keys(&registry))
}

/// Select viewable, non-built-in keys from a `/types` registry.
///
/// Entries whose descriptor is not an object are treated as not viewable.
pub fn public_type_keys(registry: &Map<String, Value>) -> Vec<String> {
    registry
        .iter()
        .filter(|(key, _)| !BUILTIN_TYPES.contains(&key.as_str()))
        .filter(|(_, descriptor)| is_viewable(descriptor))
        .map(|(key, _)| key.clone())
        .collect()
}

fn is_viewable(descriptor: &Value) -> bool {
    descriptor
        .as_object()
        .and_then(|d| d.get("viewable"))
        .is_some_and(|v| match v {
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
            Value::String(s) => !s.is_empty(),
            _ => false,
        })
}
