//! Request-scoped context passed explicitly to every tool invocation
//!
//! The upstream copilot populates `extra_info` per inbound request; tools only
//! read it. The access token lives at `extra_info.auth.ETENDO_TOKEN`.

use serde_json::{json, Value};
use uuid::Uuid;

/// Key of the Etendo bearer token inside `extra_info.auth`
pub const ETENDO_TOKEN: &str = "ETENDO_TOKEN";

/// Read-only data for a single tool invocation
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: Uuid,
    extra_info: Option<Value>,
}

impl RequestContext {
    /// Context carrying the given `extra_info` mapping
    pub fn new(extra_info: Value) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            extra_info: Some(extra_info),
        }
    }

    /// Context with no upstream data at all
    pub fn empty() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            extra_info: None,
        }
    }

    /// Context holding only an access token
    pub fn with_token(token: impl Into<String>) -> Self {
        let token: String = token.into();
        Self::new(json!({ "auth": { ETENDO_TOKEN: token } }))
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn extra_info(&self) -> Option<&Value> {
        self.extra_info.as_ref()
    }

    /// Bearer token for Etendo, if present and non-empty
    pub fn access_token(&self) -> Option<&str> {
        self.extra_info
            .as_ref()?
            .get("auth")?
            .get(ETENDO_TOKEN)?
            .as_str()
            .filter(|token| !token.is_empty())
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::empty()
    }
}
