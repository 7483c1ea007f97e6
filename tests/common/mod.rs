//! Shared fixtures for integration tests

#![allow(dead_code)]

use etendo_tools::config::{CopilotConfig, ToolConfig};
use etendo_tools::llm::LlmProvider;
use etendo_tools::ToolSystem;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

/// Purchase-like OpenAPI document with two tagged operations and one untagged
pub fn sample_spec() -> Value {
    json!({
        "openapi": "3.0.1",
        "info": {"title": "Purchase", "description": "Purchase API", "version": "1.0"},
        "servers": [{"url": "https://declared.example/api"}],
        "paths": {
            "/a": {
                "get": {
                    "description": "List A",
                    "tags": ["x"],
                    "parameters": [
                        {"name": "limit", "in": "query", "required": false},
                        {"name": "org", "in": "query", "required": true}
                    ],
                    "responses": {
                        "200": {"description": "A list"},
                        "404": {"description": "Missing"}
                    }
                }
            },
            "/b": {
                "post": {
                    "description": "Create B",
                    "tags": ["y"],
                    "requestBody": {"content": {"application/json": {"schema": {"type": "object"}}}},
                    "responses": {"201": {"description": "Created"}}
                }
            },
            "/c": {
                "delete": {"description": "Remove C"}
            }
        }
    })
}

/// Write `content` to a temporary file kept alive by the returned handle
pub fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// Configuration pointing every tool at `host` and the spec at `api_spec`
pub fn test_config(host: &str, api_spec: &str) -> CopilotConfig {
    let mut config = CopilotConfig::default();
    config.etendo.host = host.to_string();
    config.etendo.api_spec = api_spec.to_string();
    config.http.timeout_secs = 5;
    config
}

/// Register `names` as builtin tools on top of `config`
pub fn with_tools(mut config: CopilotConfig, names: &[&str]) -> CopilotConfig {
    config.tools = names
        .iter()
        .map(|name| (name.to_string(), ToolConfig::Simple("builtin".to_string())))
        .collect::<HashMap<_, _>>();
    config
}

pub async fn tool_system(
    config: &CopilotConfig,
    llm: Option<Arc<dyn LlmProvider>>,
) -> ToolSystem {
    ToolSystem::from_config(config, llm).await.unwrap()
}
