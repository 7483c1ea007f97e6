//! Builtin Etendo tools
//!
//! Each tool has its own module with pure helpers separated from I/O.

pub mod attach_file;
pub mod etendo_api;
pub mod openapi_agent;

pub use attach_file::AttachFileTool;
pub use etendo_api::EtendoApiTool;
pub use openapi_agent::OpenApiAgentTool;

/// Registry name of the file attachment tool
pub const ATTACH_FILE: &str = "attach_file";
/// Registry name of the API information tool
pub const ETENDO_API: &str = "etendo_api";
/// Registry name of the LLM-driven API agent tool
pub const OPENAPI_ETENDO: &str = "openapi_etendo";

/// Returned when the context carries no Etendo token (API tools)
pub const NO_TOKEN_MESSAGE: &str = "No token found in context. Check the Secure Web Services \
    configuration in 'Client' window as 'System administrator'";
