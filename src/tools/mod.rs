//! Tool system for the Etendo copilot
//!
//! Each tool reads a few parameters, performs a call against Etendo and
//! returns a JSON value. `ToolSystem::invoke` is the boundary towards the
//! orchestrating agent: every outcome, failures included, becomes a
//! `{"message": ...}` or `{"error": ...}` envelope.

use crate::config::{CopilotConfig, ToolConfig};
use crate::context::RequestContext;
use crate::llm::{LlmError, LlmProvider};
use crate::openapi::SpecError;
use crate::webhook::WebhookError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn, Instrument};

pub mod builtin;

/// Tool interface
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name, description and JSON Schema of the parameters
    fn describe(&self) -> ToolDescription;

    /// Receives the tool's `config` table from the configuration file
    async fn initialize(&mut self, config: Option<&Value>) -> Result<(), ToolError>;

    /// Run the tool; parameters have already been validated against `describe()`
    async fn execute(
        &self,
        parameters: &Value,
        context: &RequestContext,
    ) -> Result<Value, ToolError>;
}

/// Tool description handed to the agent (and to the LLM as a function)
#[derive(Debug, Clone)]
pub struct ToolDescription {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Envelope returned to the orchestrating agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolResponse {
    Message(Value),
    Error(String),
}

impl ToolResponse {
    pub fn from_result(result: Result<Value, ToolError>) -> Self {
        match result {
            Ok(message) => ToolResponse::Message(message),
            Err(e) => ToolResponse::Error(e.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ToolResponse::Error(_))
    }

    pub fn into_value(self) -> Value {
        Value::from(self)
    }
}

impl From<ToolResponse> for Value {
    fn from(response: ToolResponse) -> Self {
        let mut envelope = serde_json::Map::with_capacity(1);
        match response {
            ToolResponse::Message(message) => envelope.insert("message".to_string(), message),
            ToolResponse::Error(error) => envelope.insert("error".to_string(), Value::String(error)),
        };
        Value::Object(envelope)
    }
}

/// Shared resources handed to builtin tools when they are created
#[derive(Clone)]
pub struct ToolEnvironment {
    pub config: Arc<CopilotConfig>,
    pub client: reqwest::Client,
    pub llm: Option<Arc<dyn LlmProvider>>,
}

impl ToolEnvironment {
    /// Build the shared HTTP client from the configuration
    pub fn from_config(
        config: CopilotConfig,
        llm: Option<Arc<dyn LlmProvider>>,
    ) -> Result<Self, ToolError> {
        let client = crate::http::build_client(config.http_timeout())
            .map_err(|e| ToolError::InitializationError(e.to_string()))?;
        Ok(Self {
            config: Arc::new(config),
            client,
            llm,
        })
    }
}

/// Registry of configured tools
pub struct ToolSystem {
    tools: HashMap<String, Box<dyn Tool>>,
    environment: ToolEnvironment,
}

impl ToolSystem {
    pub fn new(environment: ToolEnvironment) -> Self {
        Self {
            tools: HashMap::new(),
            environment,
        }
    }

    /// Create and initialize every tool listed in `config.tools`
    pub async fn from_config(
        config: &CopilotConfig,
        llm: Option<Arc<dyn LlmProvider>>,
    ) -> Result<Self, ToolError> {
        let environment = ToolEnvironment::from_config(config.clone(), llm)?;
        let mut system = Self::new(environment);
        system.initialize(&config.tools).await?;
        Ok(system)
    }

    /// Register tools from their configuration entries
    pub async fn initialize(
        &mut self,
        tool_configs: &HashMap<String, ToolConfig>,
    ) -> Result<(), ToolError> {
        for (tool_name, tool_config) in tool_configs {
            let mut tool = self.create_tool(tool_name, tool_config)?;

            let config = match tool_config {
                ToolConfig::Simple(_) => None,
                ToolConfig::Complex { config, .. } => Some(
                    serde_json::to_value(config)
                        .map_err(|e| ToolError::InitializationError(e.to_string()))?,
                ),
            };

            tool.initialize(config.as_ref()).await?;
            debug!(tool = %tool_name, "Tool registered");

            self.tools.insert(tool_name.clone(), tool);
        }

        Ok(())
    }

    fn create_tool(&self, tool_name: &str, config: &ToolConfig) -> Result<Box<dyn Tool>, ToolError> {
        let impl_name = match config {
            ToolConfig::Simple(impl_name) => impl_name,
            ToolConfig::Complex { implementation, .. } => implementation,
        };

        match impl_name.as_str() {
            "builtin" => self.create_builtin_tool(tool_name),
            _ => Err(ToolError::UnknownImplementation(impl_name.clone())),
        }
    }

    fn create_builtin_tool(&self, tool_name: &str) -> Result<Box<dyn Tool>, ToolError> {
        let env = &self.environment;
        match tool_name {
            builtin::ATTACH_FILE => Ok(Box::new(builtin::AttachFileTool::from_environment(env))),
            builtin::ETENDO_API => Ok(Box::new(builtin::EtendoApiTool::from_environment(env))),
            builtin::OPENAPI_ETENDO => {
                let llm = env.llm.clone().ok_or_else(|| {
                    ToolError::InitializationError(format!(
                        "{tool_name} requires an LLM provider"
                    ))
                })?;
                Ok(Box::new(builtin::OpenApiAgentTool::from_environment(env, llm)))
            }
            _ => Err(ToolError::UnknownTool(tool_name.to_string())),
        }
    }

    pub fn describe_tool(&self, tool_name: &str) -> Option<ToolDescription> {
        self.tools.get(tool_name).map(|tool| tool.describe())
    }

    /// Names of registered tools, sorted
    pub fn list_tools(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Validate parameters and run a tool
    pub async fn execute_tool(
        &self,
        tool_name: &str,
        parameters: &Value,
        context: &RequestContext,
    ) -> Result<Value, ToolError> {
        let tool = self
            .tools
            .get(tool_name)
            .ok_or_else(|| ToolError::UnknownTool(tool_name.to_string()))?;

        Self::validate_parameters(&tool.describe(), parameters)?;

        tool.execute(parameters, context).await
    }

    /// Run a tool and fold the outcome into the agent-facing envelope
    pub async fn invoke(
        &self,
        tool_name: &str,
        parameters: &Value,
        context: &RequestContext,
    ) -> ToolResponse {
        let span = crate::tool_span!(tool = %tool_name, request_id = %context.request_id());
        async {
            let result = self.execute_tool(tool_name, parameters, context).await;
            if let Err(e) = &result {
                warn!(error = %e, "Tool returned an error payload");
            }
            ToolResponse::from_result(result)
        }
        .instrument(span)
        .await
    }

    fn validate_parameters(description: &ToolDescription, parameters: &Value) -> Result<(), ToolError> {
        let validator = jsonschema::validator_for(&description.parameters)
            .map_err(|e| ToolError::SchemaError(format!("Schema compilation error: {e}")))?;

        validator.validate(parameters).map_err(|errors| {
            let error_messages: Vec<String> = errors
                .map(|e| format!("At '{}': {}", e.instance_path, e))
                .collect();
            ToolError::ValidationError(error_messages.join("; "))
        })
    }
}

/// Tool errors; `Display` is exactly what ends up in the `error` envelope
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error("Unknown tool implementation: {0}")]
    UnknownImplementation(String),
    #[error("Tool initialization failed: {0}")]
    InitializationError(String),
    #[error("Parameter validation failed: {0}")]
    ValidationError(String),
    #[error("Schema error: {0}")]
    SchemaError(String),
    #[error("Tool execution failed: {0}")]
    ExecutionError(String),
    #[error("File does not exist or is not accessible")]
    FileNotAccessible,
    #[error("File too large: {size} bytes (max: {max})")]
    FileTooLarge { size: u64, max: u64 },
    #[error("{0}")]
    MissingAccessToken(String),
    #[error("Endpoint not found")]
    EndpointNotFound,
    #[error(transparent)]
    Spec(#[from] SpecError),
    #[error(transparent)]
    Webhook(#[from] WebhookError),
    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// Required string parameter
pub(crate) fn required_str<'a>(parameters: &'a Value, name: &str) -> Result<&'a str, ToolError> {
    parameters
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::ValidationError(format!("missing string parameter '{name}'")))
}

/// Optional string parameter; blank strings count as absent
pub(crate) fn optional_str<'a>(parameters: &'a Value, name: &str) -> Option<&'a str> {
    parameters
        .get(name)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
}
