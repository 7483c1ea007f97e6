//! Crate-level error type
//!
//! Tool failures are normally folded into `{"error": ...}` envelopes by
//! `ToolSystem::invoke`; `CopilotError` covers what happens around the tools
//! (loading configuration, building providers, parsing CLI input).

use thiserror::Error;

/// Main error type for the `etendo-tools` binary and library setup
#[derive(Debug, Error)]
pub enum CopilotError {
    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::config::ConfigError),

    #[error("Tool error: {0}")]
    ToolError(#[from] crate::tools::ToolError),

    #[error("LLM provider error: {0}")]
    LlmError(#[from] crate::llm::LlmError),

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

impl CopilotError {
    /// Create invalid input error
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CopilotError::InvalidInput { .. } => 2,
            _ => 1,
        }
    }
}

/// Result type alias for crate-level operations
pub type CopilotResult<T> = Result<T, CopilotError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::llm::LlmError;
    use crate::tools::ToolError;

    #[test]
    fn test_invalid_input_constructor() {
        let error = CopilotError::invalid_input("--params must be a JSON object");
        assert_eq!(
            error.to_string(),
            "Invalid input: --params must be a JSON object"
        );
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn test_from_conversions() {
        let config: CopilotError = ConfigError::InvalidConfig("bad host".to_string()).into();
        assert!(matches!(config, CopilotError::ConfigError(_)));
        assert_eq!(config.exit_code(), 1);

        let tool: CopilotError = ToolError::UnknownTool("nope".to_string()).into();
        assert_eq!(tool.to_string(), "Tool error: Unknown tool: nope");

        let llm: CopilotError = LlmError::NotConfigured("no key".to_string()).into();
        assert!(llm.to_string().starts_with("LLM provider error:"));
    }
}
