//! OpenAPI specification handling
//!
//! Loads a spec from a local file or URL, makes sure it carries a usable
//! `servers` list, and flattens its `paths` tree into endpoint descriptors
//! keyed by `"<METHOD> <path>"`.

use thiserror::Error;

pub mod loader;
pub mod reduce;
pub mod servers;

pub use loader::{load_spec, parse_spec_text, SpecFormat};
pub use reduce::{
    normalize_endpoint_key, paths_with_tag, Endpoint, EndpointDetail, EndpointSummary,
    ReducedSpec,
};
pub use servers::resolve_servers;

/// Errors raised while loading, normalizing or reducing a spec
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("Failed to read spec file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Spec source '{0}' is neither an existing file nor an http(s) URL")]
    InvalidSource(String),
    #[error("Failed to download spec from '{url}': {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to download spec from '{url}': HTTP {status}")]
    FetchStatus { url: String, status: u16 },
    #[error("Spec is neither valid JSON nor valid YAML: {0}")]
    Parse(String),
    #[error("Spec document must be a mapping at the top level")]
    NotAMapping,
    #[error(
        "No server URL available: no server_url override was given, the spec defines no \
         'servers', and it lacks 'host' and 'basePath'. Define the server_url or add \
         'servers' to the spec"
    )]
    MissingServer,
    #[error("Spec document has no 'paths' mapping")]
    MissingPaths,
}
