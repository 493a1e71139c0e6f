//! Source adapters: one per category of reading.

pub mod clock;
pub mod hardware;
pub mod server_stats;
pub mod weather;

use std::time::Duration;

use anyhow::{Context, Result};
use hud_platform::FetchError;

/// HTTP client whose timeout covers the whole request, body included.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("server-hud/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")
}

/// Maps a reqwest error to a fetch failure. The URL is stripped so query
/// credentials never reach the logs.
pub(crate) fn request_error(err: reqwest::Error, timeout: Duration) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout(timeout)
    } else {
        FetchError::Transport(err.without_url().to_string())
    }
}
