//! Shared HTTP client construction.

use std::time::Duration;

/// A client whose requests give up after `timeout`.
pub(crate) fn client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not build HTTP client, using defaults");
            reqwest::Client::new()
        })
}
