//! File attachment tool
//!
//! Uploads a local file to an Etendo record through the `AttachFile` webhook.

use super::ATTACH_FILE;
use crate::context::RequestContext;
use crate::tools::{required_str, Tool, ToolDescription, ToolEnvironment, ToolError};
use crate::webhook::WebhookClient;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use std::path::Path;
use tracing::debug;

/// Webhook registered on the Etendo side for attachments
pub const ATTACH_FILE_WEBHOOK: &str = "AttachFile";

/// Returned when the context carries no Etendo token
pub const MISSING_TOKEN_MESSAGE: &str = "No access token provided, to work with Etendo, an \
    access token is required. Make sure that the Webservices are enabled to the user role and \
    the WS are configured for the Entity.";

/// Attach file tool - builtin implementation
pub struct AttachFileTool {
    webhook: WebhookClient,
    max_file_size: u64,
}

impl AttachFileTool {
    pub fn new(webhook: WebhookClient) -> Self {
        Self {
            webhook,
            max_file_size: 10 * 1024 * 1024, // 10MB default
        }
    }

    pub fn from_environment(env: &ToolEnvironment) -> Self {
        Self::new(WebhookClient::new(
            env.client.clone(),
            env.config.etendo.host.clone(),
        ))
    }

    /// Check size constraints (pure function)
    fn check_file_size(file_size: u64, max_size: u64) -> Result<(), ToolError> {
        if file_size > max_size {
            return Err(ToolError::FileTooLarge {
                size: file_size,
                max: max_size,
            });
        }
        Ok(())
    }

    /// Read a regular, readable file within the size limit
    async fn read_attachment(path: &Path, max_size: u64) -> Result<Vec<u8>, ToolError> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|_| ToolError::FileNotAccessible)?;
        if !metadata.is_file() {
            return Err(ToolError::FileNotAccessible);
        }
        Self::check_file_size(metadata.len(), max_size)?;

        tokio::fs::read(path)
            .await
            .map_err(|_| ToolError::FileNotAccessible)
    }

    /// File name sent to Etendo (pure function)
    fn file_name(path: &Path) -> String {
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Webhook body (pure function)
    fn build_body(ad_tab_id: &str, record_id: &str, file_name: &str, content: &[u8]) -> Value {
        json!({
            "ADTabId": ad_tab_id,
            "RecordId": record_id,
            "FileName": file_name,
            "FileContent": STANDARD.encode(content),
        })
    }
}

#[async_trait]
impl Tool for AttachFileTool {
    fn describe(&self) -> ToolDescription {
        ToolDescription {
            name: ATTACH_FILE.to_string(),
            description: "Uploads a file to an API after checking its existence and accessibility."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "filepath": {
                        "type": "string",
                        "description": "The path of the file to upload"
                    },
                    "ad_tab_id": {
                        "type": "string",
                        "description": "A string of 32 chars which is the ID of the Tab"
                    },
                    "record_id": {
                        "type": "string",
                        "description": "A string of 32 chars which is the ID of the record"
                    }
                },
                "required": ["filepath", "ad_tab_id", "record_id"],
                "additionalProperties": false
            }),
        }
    }

    async fn initialize(&mut self, config: Option<&Value>) -> Result<(), ToolError> {
        if let Some(max_size) = config
            .and_then(|c| c.get("max_file_size"))
            .and_then(Value::as_u64)
        {
            self.max_file_size = max_size;
        }
        Ok(())
    }

    async fn execute(
        &self,
        parameters: &Value,
        context: &RequestContext,
    ) -> Result<Value, ToolError> {
        let filepath = required_str(parameters, "filepath")?;
        let ad_tab_id = required_str(parameters, "ad_tab_id")?;
        let record_id = required_str(parameters, "record_id")?;

        let path = Path::new(filepath);
        let content = Self::read_attachment(path, self.max_file_size).await?;

        let token = context
            .access_token()
            .ok_or_else(|| ToolError::MissingAccessToken(MISSING_TOKEN_MESSAGE.to_string()))?;

        let file_name = Self::file_name(path);
        debug!(
            file_name = %file_name,
            bytes = content.len(),
            host = %self.webhook.host(),
            "Attaching file"
        );

        let body = Self::build_body(ad_tab_id, record_id, &file_name, &content);
        Ok(self.webhook.call(ATTACH_FILE_WEBHOOK, &body, token).await?)
    }
}
