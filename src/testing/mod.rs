//! Testing utilities and mock implementations
//!
//! Lets the tools be exercised without a real LLM provider.

pub mod mocks;

pub use mocks::*;
