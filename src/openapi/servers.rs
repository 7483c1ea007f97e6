//! Server URL resolution for parsed specs

use super::SpecError;
use serde_json::{json, Value};

/// Make sure `doc` carries a usable `servers` list
///
/// First match wins: an explicit override replaces `servers`; a non-empty
/// `servers` array is kept; OpenAPI 2.0 `host` + `basePath` are combined;
/// otherwise the spec is rejected.
pub fn resolve_servers(doc: &mut Value, server_url: Option<&str>) -> Result<(), SpecError> {
    let object = doc.as_object_mut().ok_or(SpecError::NotAMapping)?;

    if let Some(url) = server_url {
        object.insert("servers".to_string(), json!([{ "url": url }]));
        return Ok(());
    }

    let has_servers = object
        .get("servers")
        .and_then(Value::as_array)
        .is_some_and(|servers| !servers.is_empty());
    if has_servers {
        return Ok(());
    }

    let legacy = match (
        object.get("host").and_then(Value::as_str),
        object.get("basePath").and_then(Value::as_str),
    ) {
        (Some(host), Some(base_path)) => Some(format!("{host}{base_path}")),
        _ => None,
    };

    match legacy {
        Some(url) => {
            object.insert("servers".to_string(), json!([{ "url": url }]));
            Ok(())
        }
        None => Err(SpecError::MissingServer),
    }
}
