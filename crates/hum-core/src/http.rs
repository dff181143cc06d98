//! Shared HTTP client for the analysis service.

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;

/// Request timeout in seconds. Pitch detection on a cold backend can take a
/// while, so this is generous.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

static CLIENT: OnceCell<reqwest::Client> = OnceCell::new();

/// Get the process-wide HTTP client, creating it on first use.
pub fn shared_client() -> Result<&'static reqwest::Client> {
    CLIENT.get_or_try_init(|| {
        reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")
    })
}
