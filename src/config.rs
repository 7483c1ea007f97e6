//! Configuration for the Etendo copilot tools
//!
//! Loaded from an optional TOML file; every section has defaults. A handful of
//! environment variables override the file so containerized deployments can be
//! configured without one.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Overrides `etendo.host`
pub const ENV_ETENDO_HOST: &str = "ETENDO_HOST";
/// Overrides `openapi_agent.model`
pub const ENV_OPENAPI_MODEL: &str = "OPENAI_MODEL_FOR_OPENAPI";
/// Overrides `etendo.api_spec`
pub const ENV_API_SPEC_FILE: &str = "COPILOT_PURCHASE_API_SPEC_FILE";

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CopilotConfig {
    #[serde(default)]
    pub etendo: EtendoSection,
    #[serde(default)]
    pub openapi_agent: OpenApiAgentSection,
    #[serde(default)]
    pub http: HttpSection,
    #[serde(default = "default_tools")]
    pub tools: HashMap<String, ToolConfig>,
}

/// Etendo instance the tools talk to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EtendoSection {
    /// Base URL of the Etendo instance
    #[serde(default = "default_host")]
    pub host: String,
    /// Local path or URL of the OpenAPI spec describing the copilot web services
    #[serde(default = "default_api_spec")]
    pub api_spec: String,
    /// Server URL written into the spec; defaults to `host`
    pub server_url: Option<String>,
}

/// LLM-driven API agent settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpenApiAgentSection {
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable containing the OpenAI API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    /// Spec used by the agent; defaults to `etendo.api_spec`
    pub api_spec: Option<String>,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default)]
    pub temperature: f32,
    /// API responses longer than this are truncated before reaching the LLM
    #[serde(default = "default_max_response_chars")]
    pub max_response_chars: usize,
}

/// Outbound HTTP settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HttpSection {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Tool registration: `name = "builtin"` or `name = { impl = "builtin", config = { ... } }`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ToolConfig {
    Simple(String),
    Complex {
        #[serde(rename = "impl")]
        implementation: String,
        #[serde(default)]
        config: HashMap<String, serde_json::Value>,
    },
}

fn default_host() -> String {
    "http://host.docker.internal:8080/etendo".to_string()
}

fn default_api_spec() -> String {
    "/modules/com.etendoerp.copilot.openapi.purchase/web/com.etendoerp.copilot.openapi.purchase/doc/openapi3_1.json".to_string()
}

fn default_model() -> String {
    "gpt-4-turbo-preview".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_max_iterations() -> usize {
    8
}

fn default_max_response_chars() -> usize {
    4000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_tools() -> HashMap<String, ToolConfig> {
    HashMap::from([
        (
            "attach_file".to_string(),
            ToolConfig::Simple("builtin".to_string()),
        ),
        (
            "etendo_api".to_string(),
            ToolConfig::Simple("builtin".to_string()),
        ),
    ])
}

impl Default for EtendoSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            api_spec: default_api_spec(),
            server_url: None,
        }
    }
}

impl Default for OpenApiAgentSection {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key_env: default_api_key_env(),
            base_url: default_llm_base_url(),
            api_spec: None,
            max_iterations: default_max_iterations(),
            temperature: 0.0,
            max_response_chars: default_max_response_chars(),
        }
    }
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for CopilotConfig {
    fn default() -> Self {
        Self {
            etendo: EtendoSection::default(),
            openapi_agent: OpenApiAgentSection::default(),
            http: HttpSection::default(),
            tools: default_tools(),
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CopilotConfig {
    /// Load configuration from a TOML file, then apply environment overrides
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: CopilotConfig = toml::from_str(&content)?;

        config.apply_env_overrides(|name| std::env::var(name).ok());
        config.validate()?;

        Ok(config)
    }

    /// Defaults plus environment overrides, for running without a file
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from `lookup`; unset or empty variables are ignored
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(host) = lookup(ENV_ETENDO_HOST) {
            self.etendo.host = host;
        }
        if let Some(model) = lookup(ENV_OPENAPI_MODEL) {
            self.openapi_agent.model = model;
        }
        if let Some(spec) = lookup(ENV_API_SPEC_FILE) {
            self.etendo.api_spec = spec;
        }
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_absolute_url("etendo.host", &self.etendo.host)?;
        if let Some(server_url) = &self.etendo.server_url {
            validate_absolute_url("etendo.server_url", server_url)?;
        }
        validate_absolute_url("openapi_agent.base_url", &self.openapi_agent.base_url)?;

        if self.http.timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "http.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.openapi_agent.max_iterations == 0 {
            return Err(ConfigError::InvalidConfig(
                "openapi_agent.max_iterations must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Server URL written into loaded specs
    pub fn server_url(&self) -> &str {
        self.etendo
            .server_url
            .as_deref()
            .unwrap_or(&self.etendo.host)
    }

    /// Spec source used by the API agent
    pub fn agent_spec_source(&self) -> &str {
        self.openapi_agent
            .api_spec
            .as_deref()
            .unwrap_or(&self.etendo.api_spec)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }

    /// Get the OpenAI API key from the configured environment variable
    pub fn get_llm_api_key(&self) -> Result<String, ConfigError> {
        let name = &self.openapi_agent.api_key_env;
        std::env::var(name).map_err(|_| ConfigError::EnvVarNotFound(name.clone()))
    }
}

fn validate_absolute_url(field: &str, value: &str) -> Result<(), ConfigError> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(ConfigError::InvalidConfig(format!(
            "{field} must be an absolute http(s) URL, got '{value}'"
        ))),
    }
}
