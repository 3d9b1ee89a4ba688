//! Chat backend clients
//!
//! A backend turns one user message into one reply string. Three wire
//! shapes are supported: a generic `{message}`/`{reply}` endpoint, Ollama's
//! `/api/generate`, and Ollama's `/api/chat`.

pub mod base;
pub mod client;
pub mod generic;
pub mod ollama;

pub use base::{
    ChatBackend, CHAT_ERROR_PREFIX, GENERATE_ERROR_PREFIX, GENERIC_ERROR_PREFIX,
    NO_CHAT_MESSAGE_SENTINEL, NO_ENDPOINT_REPLY, NO_GENERATE_RESPONSE_SENTINEL, NO_REPLY_SENTINEL,
};
pub use client::{HttpChatBackend, USER_AGENT};

use crate::error::Result;

/// Create the default backend
///
/// # Errors
///
/// Returns error if the HTTP client cannot be initialized
pub fn create_backend() -> Result<Box<dyn ChatBackend>> {
    Ok(Box::new(HttpChatBackend::new()?))
}
