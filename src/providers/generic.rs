//! Generic JSON chat endpoint
//!
//! Request: `{"message": "..."}`. Reply: the `reply` field of the JSON
//! response body.

use super::base::NO_REPLY_SENTINEL;
use crate::error::Result;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct GenericRequest<'a> {
    message: &'a str,
}

/// Pull the reply text out of a generic response body
///
/// Non-string values are rendered as JSON; a missing or null `reply`
/// yields [`NO_REPLY_SENTINEL`].
pub fn extract_reply(body: &serde_json::Value) -> String {
    match body.get("reply") {
        Some(serde_json::Value::String(text)) => text.clone(),
        Some(serde_json::Value::Null) | None => NO_REPLY_SENTINEL.to_string(),
        Some(other) => other.to_string(),
    }
}

/// POST `message` to a generic endpoint
///
/// # Errors
///
/// Returns an error if the request fails, times out, or the body is not
/// JSON.
pub async fn send(
    client: &Client,
    endpoint: &str,
    message: &str,
    timeout: Duration,
) -> Result<String> {
    let response = client
        .post(endpoint)
        .timeout(timeout)
        .json(&GenericRequest { message })
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        tracing::warn!("Chat endpoint returned status {}", status);
    }

    let body: serde_json::Value = response.json().await?;
    Ok(extract_reply(&body))
}
