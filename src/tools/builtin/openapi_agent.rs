//! LLM-driven API tool
//!
//! Answers a free-form question by letting a language model explore the
//! Etendo API. The model sees the endpoint listing of the reduced spec and
//! may call two functions before answering:
//!
//! - `api_docs`: reduced documentation of one `"METHOD /path"` endpoint
//! - `api_request`: a bearer-authorized call against the resolved server
//!
//! The loop ends when the model answers without requesting functions, or
//! fails once `max_iterations` completions have been spent.

use super::{NO_TOKEN_MESSAGE, OPENAPI_ETENDO};
use crate::context::RequestContext;
use crate::llm::{CompletionRequest, CompletionResponse, LlmProvider, Message, ToolCall};
use crate::openapi::{load_spec, normalize_endpoint_key, resolve_servers, ReducedSpec};
use crate::tools::{required_str, Tool, ToolDescription, ToolEnvironment, ToolError};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, Instrument};

const API_DOCS: &str = "api_docs";
const API_REQUEST: &str = "api_request";
const TRUNCATION_MARKER: &str = "...[truncated]";

pub struct OpenApiAgentTool {
    client: reqwest::Client,
    llm: Arc<dyn LlmProvider>,
    spec_source: String,
    server_url: String,
    model: String,
    temperature: f32,
    max_iterations: usize,
    max_response_chars: usize,
}

impl OpenApiAgentTool {
    pub fn from_environment(env: &ToolEnvironment, llm: Arc<dyn LlmProvider>) -> Self {
        let config = &env.config;
        let agent = &config.openapi_agent;
        Self {
            client: env.client.clone(),
            llm,
            spec_source: config.agent_spec_source().to_string(),
            server_url: config.server_url().to_string(),
            model: agent.model.clone(),
            temperature: agent.temperature,
            max_iterations: agent.max_iterations,
            max_response_chars: agent.max_response_chars,
        }
    }

    /// Functions offered to the model
    fn functions() -> Vec<ToolDescription> {
        vec![
            ToolDescription {
                name: API_DOCS.to_string(),
                description: "Returns the description, required parameters, request body and \
                    response of one endpoint of the API"
                    .to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "endpoint": {
                            "type": "string",
                            "description": "Method and path, for example 'GET /example'"
                        }
                    },
                    "required": ["endpoint"]
                }),
            },
            ToolDescription {
                name: API_REQUEST.to_string(),
                description: "Performs an authenticated request against the API and returns the \
                    status code and response body"
                    .to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "method": {
                            "type": "string",
                            "enum": ["GET", "POST", "PUT", "PATCH", "DELETE"]
                        },
                        "path": {
                            "type": "string",
                            "description": "Path relative to the server url, starting with '/'"
                        },
                        "query": {
                            "type": "object",
                            "description": "Query string parameters"
                        },
                        "body": {
                            "description": "JSON request body"
                        }
                    },
                    "required": ["method", "path"]
                }),
            },
        ]
    }

    /// System prompt listing the endpoints (pure function)
    fn system_prompt(reduced: &ReducedSpec, base_url: &str) -> String {
        let endpoints: Vec<String> = reduced
            .endpoints
            .iter()
            .map(|endpoint| match &endpoint.description {
                Some(description) => format!("- {}: {}", endpoint.key, description),
                None => format!("- {}", endpoint.key),
            })
            .collect();

        format!(
            "You are an agent that answers questions by calling the Etendo API.\n\
             Base URL: {base_url}\n\
             API description: {}\n\
             Endpoints:\n{}\n\n\
             Use {API_DOCS} to read the documentation of an endpoint before calling it with \
             {API_REQUEST}. When you have the answer, reply with it directly.",
            reduced.description,
            endpoints.join("\n")
        )
    }

    /// Check if iteration limit is exceeded (pure validation)
    fn check_iteration_limit(iteration: usize, max_iterations: usize) -> Result<(), ToolError> {
        if iteration > max_iterations {
            return Err(ToolError::ExecutionError(format!(
                "API agent exceeded maximum iterations ({max_iterations})"
            )));
        }
        Ok(())
    }

    /// Add assistant response to messages (pure function)
    fn add_assistant_response(messages: &mut Vec<Message>, response: &CompletionResponse) {
        if let Some(content) = &response.content {
            messages.push(Message::assistant(content.clone()));
        }
    }

    /// Add function results to messages (pure function)
    fn add_tool_results(messages: &mut Vec<Message>, tool_results: &[String]) {
        if !tool_results.is_empty() {
            messages.push(Message::user(format!(
                "Tool results:\n{}",
                tool_results.join("\n")
            )));
        }
    }

    /// Truncate on a char boundary (pure function)
    fn truncate_chars(text: &str, max_chars: usize) -> String {
        match text.char_indices().nth(max_chars) {
            Some((index, _)) => format!("{}{TRUNCATION_MARKER}", &text[..index]),
            None => text.to_string(),
        }
    }

    /// Validate the method requested by the model (pure function)
    fn parse_method(raw: &str) -> Result<Method, ToolError> {
        match raw.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::GET),
            "POST" => Ok(Method::POST),
            "PUT" => Ok(Method::PUT),
            "PATCH" => Ok(Method::PATCH),
            "DELETE" => Ok(Method::DELETE),
            other => Err(ToolError::ValidationError(format!(
                "unsupported method '{other}'"
            ))),
        }
    }

    /// Join a relative path onto the server url (pure function)
    fn request_url(base_url: &str, path: &str) -> Result<String, ToolError> {
        if !path.starts_with('/') || path.starts_with("//") {
            return Err(ToolError::ValidationError(format!(
                "path must be relative to the server and start with '/': {path}"
            )));
        }
        Ok(format!("{}{}", base_url.trim_end_matches('/'), path))
    }

    /// Query parameters as string pairs (pure function)
    fn query_pairs(query: Option<&Value>) -> Vec<(String, String)> {
        query
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .map(|(key, value)| {
                        let value = match value {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        };
                        (key.clone(), value)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn api_docs(reduced: &ReducedSpec, arguments: &Value) -> Result<String, ToolError> {
        let key = normalize_endpoint_key(required_str(arguments, "endpoint")?);
        let endpoint = reduced.find(&key).ok_or(ToolError::EndpointNotFound)?;
        Ok(endpoint.docs.to_string())
    }

    async fn api_request(
        &self,
        base_url: &str,
        arguments: &Value,
        token: &str,
    ) -> Result<String, ToolError> {
        let method = Self::parse_method(required_str(arguments, "method")?)?;
        let url = Self::request_url(base_url, required_str(arguments, "path")?)?;
        debug!(%method, %url, "API agent request");

        let mut request = self
            .client
            .request(method, &url)
            .bearer_auth(token)
            .query(&Self::query_pairs(arguments.get("query")));
        if let Some(body) = arguments.get("body").filter(|body| !body.is_null()) {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ToolError::ExecutionError(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ToolError::ExecutionError(e.to_string()))?;

        Ok(format!(
            "HTTP {}\n{}",
            status.as_u16(),
            Self::truncate_chars(&body, self.max_response_chars)
        ))
    }

    async fn run_function(
        &self,
        call: &ToolCall,
        reduced: &ReducedSpec,
        base_url: &str,
        token: &str,
    ) -> String {
        let result = match call.name.as_str() {
            API_DOCS => Self::api_docs(reduced, &call.arguments),
            API_REQUEST => self.api_request(base_url, &call.arguments, token).await,
            other => Err(ToolError::UnknownTool(other.to_string())),
        };

        match result {
            Ok(output) => format!("Tool {} returned: {}", call.name, output),
            Err(e) => format!("Tool {} failed: {}", call.name, e),
        }
    }

    fn create_completion_request(&self, messages: Vec<Message>) -> CompletionRequest {
        CompletionRequest {
            messages,
            model: self.model.clone(),
            max_tokens: None,
            temperature: Some(self.temperature),
            tools: Some(Self::functions()),
        }
    }
}

#[async_trait]
impl Tool for OpenApiAgentTool {
    fn describe(&self) -> ToolDescription {
        ToolDescription {
            name: OPENAPI_ETENDO.to_string(),
            description: "Based on the OpenAPI specification, allows you to interact with the \
                Etendo API by asking a question or giving an instruction in natural language."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "question_prompt": {
                        "type": "string",
                        "description": "The question/request prompt to be asked to the OpenAPI specification"
                    }
                },
                "required": ["question_prompt"]
            }),
        }
    }

    async fn initialize(&mut self, config: Option<&Value>) -> Result<(), ToolError> {
        let Some(config) = config else {
            return Ok(());
        };

        if let Some(max_iterations) = config.get("max_iterations").and_then(Value::as_u64) {
            if max_iterations == 0 {
                return Err(ToolError::InitializationError(
                    "max_iterations must be greater than zero".to_string(),
                ));
            }
            self.max_iterations = max_iterations as usize;
        }
        if let Some(max_chars) = config.get("max_response_chars").and_then(Value::as_u64) {
            self.max_response_chars = max_chars as usize;
        }
        Ok(())
    }

    async fn execute(
        &self,
        parameters: &Value,
        context: &RequestContext,
    ) -> Result<Value, ToolError> {
        let question = required_str(parameters, "question_prompt")?;
        let token = context
            .access_token()
            .ok_or_else(|| ToolError::MissingAccessToken(NO_TOKEN_MESSAGE.to_string()))?;

        let span = crate::spec_span!(source = %self.spec_source);
        let mut doc = load_spec(&self.spec_source, &self.client)
            .instrument(span)
            .await?;
        resolve_servers(&mut doc, Some(&self.server_url))?;
        let reduced = ReducedSpec::from_document(&doc)?;
        let base_url = reduced.server_url().unwrap_or(&self.server_url).to_string();

        let mut messages = vec![
            Message::system(Self::system_prompt(&reduced, &base_url)),
            Message::user(question),
        ];

        let mut iteration = 0;
        loop {
            iteration += 1;
            Self::check_iteration_limit(iteration, self.max_iterations)?;

            let request = self.create_completion_request(messages.clone());
            let response = self.llm.complete(request).await?;

            Self::add_assistant_response(&mut messages, &response);

            let calls = response.requested_calls();
            if calls.is_empty() {
                info!(
                    provider = self.llm.name(),
                    iterations = iteration,
                    "API agent answered"
                );
                return Ok(Value::String(response.content.unwrap_or_default()));
            }

            debug!(iteration, calls = calls.len(), "API agent calling functions");
            let mut tool_results = Vec::with_capacity(calls.len());
            for call in calls {
                tool_results.push(self.run_function(call, &reduced, &base_url, token).await);
            }
            Self::add_tool_results(&mut messages, &tool_results);
        }
    }
}
