//! Spec loading: local file or remote URL, JSON or YAML

use super::SpecError;
use serde_json::{Map, Number, Value};
use std::path::Path;
use tracing::debug;
use url::Url;

/// Format detected for a spec text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecFormat {
    Json,
    Yaml,
}

impl SpecFormat {
    /// Sniff the format from the first non-whitespace character (pure function)
    pub fn sniff(text: &str) -> Self {
        match text.trim_start().chars().next() {
            Some('{') | Some('[') => SpecFormat::Json,
            _ => SpecFormat::Yaml,
        }
    }
}

/// Load and parse a spec from a local path or an http(s) URL
pub async fn load_spec(source: &str, client: &reqwest::Client) -> Result<Value, SpecError> {
    let text = read_spec_source(source, client).await?;
    parse_spec_text(&text)
}

async fn read_spec_source(source: &str, client: &reqwest::Client) -> Result<String, SpecError> {
    let path = Path::new(source);
    if path.is_file() {
        debug!(source, "Spec source detected as local file");
        return tokio::fs::read_to_string(path)
            .await
            .map_err(|source_err| SpecError::Read {
                path: source.to_string(),
                source: source_err,
            });
    }

    let url = parse_remote_url(source)?;
    debug!(%url, "Downloading spec");

    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| SpecError::Fetch {
            url: source.to_string(),
            source: e,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(SpecError::FetchStatus {
            url: source.to_string(),
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(|e| SpecError::Fetch {
        url: source.to_string(),
        source: e,
    })
}

/// Accept only absolute http(s) URLs as remote sources (pure function)
fn parse_remote_url(source: &str) -> Result<Url, SpecError> {
    match Url::parse(source) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(url),
        _ => Err(SpecError::InvalidSource(source.to_string())),
    }
}

/// Parse spec text as JSON or YAML based on its leading character
///
/// JSON-looking text that fails to parse as JSON gets a second chance as YAML,
/// which accepts a superset of JSON (trailing commas aside).
pub fn parse_spec_text(text: &str) -> Result<Value, SpecError> {
    match SpecFormat::sniff(text) {
        SpecFormat::Json => {
            debug!("Spec detected as JSON");
            serde_json::from_str(text).or_else(|json_err| {
                parse_yaml(text).map_err(|yaml_err| {
                    SpecError::Parse(format!("JSON: {json_err}; YAML: {yaml_err}"))
                })
            })
        }
        SpecFormat::Yaml => {
            debug!("Spec detected as YAML");
            parse_yaml(text).map_err(SpecError::Parse)
        }
    }
}

fn parse_yaml(text: &str) -> Result<Value, String> {
    let mut yaml: serde_yaml::Value = serde_yaml::from_str(text).map_err(|e| e.to_string())?;
    // `<<: *anchor` stays a literal key until merged
    yaml.apply_merge().map_err(|e| e.to_string())?;
    yaml_to_json(yaml)
}

/// Convert a YAML tree to JSON, stringifying scalar mapping keys
///
/// OpenAPI YAML routinely uses unquoted status codes (`200:`) as keys, which a
/// direct deserialization into `serde_json::Value` rejects.
fn yaml_to_json(yaml: serde_yaml::Value) -> Result<Value, String> {
    use serde_yaml::Value as Yaml;

    Ok(match yaml {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => yaml_number_to_json(&n)?,
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(yaml_to_json)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Yaml::Mapping(mapping) => {
            let mut object = Map::with_capacity(mapping.len());
            for (key, value) in mapping {
                object.insert(yaml_key_to_string(key)?, yaml_to_json(value)?);
            }
            Value::Object(object)
        }
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value)?,
    })
}

fn yaml_number_to_json(n: &serde_yaml::Number) -> Result<Value, String> {
    if let Some(i) = n.as_i64() {
        Ok(Value::from(i))
    } else if let Some(u) = n.as_u64() {
        Ok(Value::from(u))
    } else {
        n.as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| format!("unsupported YAML number: {n}"))
    }
}

fn yaml_key_to_string(key: serde_yaml::Value) -> Result<String, String> {
    use serde_yaml::Value as Yaml;

    match key {
        Yaml::String(s) => Ok(s),
        Yaml::Number(n) => Ok(n.to_string()),
        Yaml::Bool(b) => Ok(b.to_string()),
        Yaml::Null => Ok("null".to_string()),
        Yaml::Tagged(tagged) => yaml_key_to_string(tagged.value),
        other => Err(format!("unsupported YAML mapping key: {other:?}")),
    }
}
