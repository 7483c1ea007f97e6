//! Shared HTTP client construction

use reqwest::Client;
use std::time::Duration;

/// User agent sent on every outbound request
pub const USER_AGENT: &str = concat!("etendo-tools/", env!("CARGO_PKG_VERSION"));

/// Build the client used for spec downloads, webhooks and API calls
pub fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .user_agent(USER_AGENT)
        .build()
}
