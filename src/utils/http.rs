use std::time::Duration;

use once_cell::sync::Lazy;
use reqwest::Client;
use thiserror::Error;

/// Default timeout for source fetches in seconds.
const DEFAULT_TIMEOUT: u64 = 15;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("http status {0}")]
    Status(u16),
}

/// Shared client for all source fetches. Probe paths build their own clients
/// because they need per-proxy routing and tighter deadlines.
pub static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT))
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_default()
});

/// GETs a URL and returns the body for 2xx responses.
pub async fn web_get(url: &str) -> Result<String, HttpError> {
    let resp = HTTP_CLIENT
        .get(url)
        .send()
        .await
        .map_err(|e| HttpError::Request(e.to_string()))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(HttpError::Status(status.as_u16()));
    }
    resp.text()
        .await
        .map_err(|e| HttpError::Request(e.to_string()))
}
