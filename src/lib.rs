//! Etendo copilot tools
//!
//! Tool adapters that let a language-model-driven agent work with an Etendo
//! ERP instance:
//!
//! - `attach_file`: upload a local file to a record through the `AttachFile` webhook
//! - `etendo_api`: describe the ERP's REST API from its OpenAPI document
//! - `openapi_etendo`: answer a question by letting an LLM call that API
//!
//! Every tool invocation resolves to a JSON envelope, `{"message": ...}` on
//! success or `{"error": "..."}` on failure.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use etendo_tools::{CopilotConfig, RequestContext, ToolSystem};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CopilotConfig::from_env()?;
//! let tools = ToolSystem::from_config(&config, None).await?;
//!
//! let context = RequestContext::with_token("eyJhbGciOi...");
//! let envelope = tools
//!     .invoke("etendo_api", &json!({"tag": "Purchase"}), &context)
//!     .await;
//! println!("{}", envelope.into_value());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod llm;
pub mod observability;
pub mod openapi;
pub mod testing;
pub mod tools;
pub mod webhook;

pub use config::*;
pub use context::RequestContext;
pub use error::{CopilotError, CopilotResult};
pub use openapi::{ReducedSpec, SpecError};
pub use tools::{Tool, ToolDescription, ToolError, ToolResponse, ToolSystem};
pub use webhook::{WebhookClient, WebhookError};
