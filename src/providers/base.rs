//! Backend trait and reply sentinels shared by all wire formats

use crate::config::Settings;
use async_trait::async_trait;

/// Reply used when no endpoint is configured; no request is made
pub const NO_ENDPOINT_REPLY: &str = "No endpoint configured.";

/// Reply when a generic backend answers without a `reply` field
pub const NO_REPLY_SENTINEL: &str = "No reply in response";

/// Reply when Ollama generate answers without a `response` field
pub const NO_GENERATE_RESPONSE_SENTINEL: &str = "No response returned by Ollama.";

/// Reply when Ollama chat answers without `message.content`
pub const NO_CHAT_MESSAGE_SENTINEL: &str = "No message returned by Ollama Chat.";

/// Prefix of replies describing a failed generic request
pub const GENERIC_ERROR_PREFIX: &str = "Error contacting endpoint: ";

/// Prefix of replies describing a failed Ollama generate request
pub const GENERATE_ERROR_PREFIX: &str = "Error contacting Ollama Generate API: ";

/// Prefix of replies describing a failed Ollama chat request
pub const CHAT_ERROR_PREFIX: &str = "Error contacting Ollama Chat API: ";

/// Something that turns a user message into a reply
///
/// Implementations never fail: transport and decoding problems are turned
/// into a reply string describing the error, so the conversation can
/// continue.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send `message` using the given settings and return the reply text
    async fn send(&self, message: &str, settings: &Settings) -> String;
}
