//! API information tool
//!
//! Describes the Etendo REST API from its OpenAPI document: either a general
//! listing of endpoints (optionally filtered by tag) or the full detail of a
//! single `"METHOD /path"` endpoint.

use super::{ETENDO_API, NO_TOKEN_MESSAGE};
use crate::context::RequestContext;
use crate::openapi::{
    load_spec, normalize_endpoint_key, paths_with_tag, resolve_servers, ReducedSpec,
};
use crate::tools::{optional_str, Tool, ToolDescription, ToolEnvironment, ToolError};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, Instrument};

pub struct EtendoApiTool {
    client: reqwest::Client,
    spec_source: String,
    server_url: String,
    host: String,
}

impl EtendoApiTool {
    pub fn new(
        client: reqwest::Client,
        spec_source: impl Into<String>,
        server_url: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        Self {
            client,
            spec_source: spec_source.into(),
            server_url: server_url.into(),
            host: host.into(),
        }
    }

    pub fn from_environment(env: &ToolEnvironment) -> Self {
        let config = &env.config;
        Self::new(
            env.client.clone(),
            config.etendo.api_spec.clone(),
            config.server_url(),
            config.etendo.host.clone(),
        )
    }

    /// Detail of one endpoint (pure function)
    fn endpoint_detail(reduced: &ReducedSpec, key: &str) -> Result<Value, ToolError> {
        let endpoint = reduced.find(key).ok_or(ToolError::EndpointNotFound)?;
        serde_json::to_value(endpoint.detail())
            .map_err(|e| ToolError::ExecutionError(e.to_string()))
    }

    /// General listing (pure function)
    fn general_listing(
        doc: &Value,
        reduced: &ReducedSpec,
        tag: Option<&str>,
        token: &str,
        host: &str,
    ) -> Result<Value, ToolError> {
        let tagged = tag.map(|tag| paths_with_tag(doc, tag)).transpose()?;
        let url = if reduced.servers.is_empty() { "" } else { host };

        Ok(json!({
            "token": token,
            "url": url,
            "description": reduced.description,
            "endpoints": reduced.summaries(tagged.as_ref()),
        }))
    }
}

#[async_trait]
impl Tool for EtendoApiTool {
    fn describe(&self) -> ToolDescription {
        ToolDescription {
            name: ETENDO_API.to_string(),
            description: "Based on the OpenAPI specification, returns information about the \
                Etendo API: the server url, the endpoints, and the parameters and responses of \
                each endpoint. Without `endpoint` it lists every endpoint with its description; \
                with `endpoint` (for example \"GET /example\") it returns the request body and \
                responses of that endpoint."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "tag": {
                        "type": "string",
                        "description": "Only list endpoints carrying this tag. Ignored when endpoint is provided"
                    },
                    "endpoint": {
                        "type": "string",
                        "description": "Method and path of the endpoint, for example 'GET /example'"
                    }
                }
            }),
        }
    }

    async fn initialize(&mut self, _config: Option<&Value>) -> Result<(), ToolError> {
        Ok(())
    }

    async fn execute(
        &self,
        parameters: &Value,
        context: &RequestContext,
    ) -> Result<Value, ToolError> {
        let endpoint = optional_str(parameters, "endpoint").map(normalize_endpoint_key);
        let tag = optional_str(parameters, "tag");

        let token = context
            .access_token()
            .ok_or_else(|| ToolError::MissingAccessToken(NO_TOKEN_MESSAGE.to_string()))?;

        let span = crate::spec_span!(source = %self.spec_source);
        let mut doc = load_spec(&self.spec_source, &self.client)
            .instrument(span)
            .await?;
        resolve_servers(&mut doc, Some(&self.server_url))?;
        let reduced = ReducedSpec::from_document(&doc)?;
        debug!(endpoints = reduced.endpoints.len(), "Spec reduced");

        match endpoint {
            Some(key) => Self::endpoint_detail(&reduced, &key),
            None => Self::general_listing(&doc, &reduced, tag, token, &self.host),
        }
    }
}
