//! Spec reduction: flatten the `paths` tree into endpoint descriptors
//!
//! Descriptors are recomputed on every call and never cached.

use super::SpecError;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// HTTP methods considered when flattening path items
pub const HTTP_METHODS: &[&str] = &["get", "post", "put", "patch", "delete"];

/// One flattened operation
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    /// `"<METHOD> <path>"`, method upper-cased
    pub key: String,
    pub description: Option<String>,
    /// Reduced operation docs (description, required parameters, requestBody, responses)
    pub docs: Value,
}

/// Entry of the general listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointSummary {
    pub path: String,
    pub description: Option<String>,
}

/// Full detail for a single endpoint lookup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointDetail {
    pub path: String,
    pub description: Option<String>,
    #[serde(rename = "requestBody")]
    pub request_body: Option<Value>,
    pub responses: Option<Value>,
}

impl Endpoint {
    pub fn summary(&self) -> EndpointSummary {
        EndpointSummary {
            path: self.key.clone(),
            description: self.description.clone(),
        }
    }

    pub fn detail(&self) -> EndpointDetail {
        EndpointDetail {
            path: self.key.clone(),
            description: self
                .docs
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
            request_body: self.docs.get("requestBody").cloned(),
            responses: self.docs.get("responses").cloned(),
        }
    }
}

/// A spec flattened into endpoint descriptors
#[derive(Debug, Clone, PartialEq)]
pub struct ReducedSpec {
    pub servers: Vec<Value>,
    pub description: String,
    pub endpoints: Vec<Endpoint>,
}

impl ReducedSpec {
    /// Reduce a (server-normalized) spec document
    pub fn from_document(doc: &Value) -> Result<Self, SpecError> {
        let paths = paths_of(doc)?;

        let endpoints = operations(paths)
            .map(|(key, operation)| Endpoint {
                key,
                description: operation
                    .get("description")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                docs: reduce_operation(operation),
            })
            .collect();

        Ok(Self {
            servers: doc
                .get("servers")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
            description: doc
                .pointer("/info/description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            endpoints,
        })
    }

    /// Exact lookup by `"<METHOD> <path>"` key
    pub fn find(&self, key: &str) -> Option<&Endpoint> {
        self.endpoints.iter().find(|endpoint| endpoint.key == key)
    }

    /// General listing, restricted to `allowed` keys when given
    pub fn summaries(&self, allowed: Option<&HashSet<String>>) -> Vec<EndpointSummary> {
        self.endpoints
            .iter()
            .filter(|endpoint| allowed.map_or(true, |keys| keys.contains(&endpoint.key)))
            .map(Endpoint::summary)
            .collect()
    }

    /// URL of the first declared server
    pub fn server_url(&self) -> Option<&str> {
        self.servers
            .first()
            .and_then(|server| server.get("url"))
            .and_then(Value::as_str)
    }
}

/// Keys of every operation whose `tags` list contains `tag`
pub fn paths_with_tag(doc: &Value, tag: &str) -> Result<HashSet<String>, SpecError> {
    let paths = paths_of(doc)?;
    Ok(operations(paths)
        .filter(|(_, operation)| {
            operation
                .get("tags")
                .and_then(Value::as_array)
                .is_some_and(|tags| tags.iter().any(|t| t.as_str() == Some(tag)))
        })
        .map(|(key, _)| key)
        .collect())
}

/// Strip any `?query` suffix and surrounding whitespace from an endpoint key
pub fn normalize_endpoint_key(raw: &str) -> String {
    raw.split('?').next().unwrap_or_default().trim().to_string()
}

fn paths_of(doc: &Value) -> Result<&Map<String, Value>, SpecError> {
    doc.get("paths")
        .and_then(Value::as_object)
        .ok_or(SpecError::MissingPaths)
}

fn operations(paths: &Map<String, Value>) -> impl Iterator<Item = (String, &Value)> {
    paths.iter().flat_map(|(path, item)| {
        HTTP_METHODS.iter().filter_map(move |method| {
            item.get(*method)
                .filter(|operation| operation.is_object())
                .map(|operation| (format!("{} {}", method.to_uppercase(), path), operation))
        })
    })
}

/// Keep only what a caller needs to invoke an operation
fn reduce_operation(operation: &Value) -> Value {
    let mut out = Map::new();

    if let Some(description) = operation
        .get("description")
        .filter(|d| d.as_str().is_some_and(|s| !s.is_empty()))
    {
        out.insert("description".to_string(), description.clone());
    }

    if let Some(parameters) = operation.get("parameters").and_then(Value::as_array) {
        if !parameters.is_empty() {
            let required: Vec<Value> = parameters
                .iter()
                .filter(|p| p.get("required").and_then(Value::as_bool) == Some(true))
                .cloned()
                .collect();
            out.insert("parameters".to_string(), Value::Array(required));
        }
    }

    if let Some(response) = success_response(operation) {
        out.insert("responses".to_string(), response.clone());
    }

    if let Some(body) = operation.get("requestBody").filter(|b| !is_empty(b)) {
        out.insert("requestBody".to_string(), body.clone());
    }

    Value::Object(out)
}

/// The `200` response, or the first other 2xx one
fn success_response(operation: &Value) -> Option<&Value> {
    let responses = operation.get("responses")?.as_object()?;
    responses.get("200").or_else(|| {
        responses
            .iter()
            .find(|(code, _)| code.len() == 3 && code.starts_with('2'))
            .map(|(_, response)| response)
    })
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}
