//! LLM provider abstraction used by the API agent tool

pub mod provider;
pub mod providers;

pub use provider::*;
pub use providers::*;
