//! HTTP implementation of [`ChatBackend`]

use super::base::{
    ChatBackend, CHAT_ERROR_PREFIX, GENERATE_ERROR_PREFIX, GENERIC_ERROR_PREFIX,
    NO_ENDPOINT_REPLY,
};
use super::{generic, ollama};
use crate::config::{BackendKind, Settings};
use crate::error::{Result, VaporError};
use async_trait::async_trait;
use reqwest::Client;

/// User agent sent with every backend request
pub const USER_AGENT: &str = concat!("vapor/", env!("CARGO_PKG_VERSION"));

/// Chat backend speaking HTTP+JSON
///
/// The wire shape, endpoint, model and timeout are taken from the
/// [`Settings`] passed to each call, so a configuration reload takes effect
/// on the next message without rebuilding the client.
#[derive(Debug, Clone)]
pub struct HttpChatBackend {
    client: Client,
}

impl HttpChatBackend {
    /// Create a backend with its own connection pool
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    ///
    /// # Examples
    ///
    /// ```
    /// use vapor::providers::HttpChatBackend;
    ///
    /// let backend = HttpChatBackend::new().unwrap();
    /// ```
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| VaporError::Backend(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Wrap an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

/// Render a failed request as the text shown to the user
fn describe_error(err: &anyhow::Error) -> String {
    match err.downcast_ref::<VaporError>() {
        Some(VaporError::Backend(message)) => message.clone(),
        _ => err.to_string(),
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn send(&self, message: &str, settings: &Settings) -> String {
        let Some(endpoint) = settings.endpoint.as_deref() else {
            tracing::debug!("No endpoint configured, skipping request");
            return NO_ENDPOINT_REPLY.to_string();
        };
        let model = settings.model.as_deref().unwrap_or("");

        tracing::debug!(
            endpoint,
            kind = %settings.backend_kind,
            model,
            "Sending message to backend"
        );

        let (result, prefix) = match settings.backend_kind {
            BackendKind::Generic => (
                generic::send(&self.client, endpoint, message, settings.timeout).await,
                GENERIC_ERROR_PREFIX,
            ),
            BackendKind::OllamaGenerate => (
                ollama::generate(&self.client, endpoint, model, message, settings.timeout).await,
                GENERATE_ERROR_PREFIX,
            ),
            BackendKind::OllamaChat => (
                ollama::chat(&self.client, endpoint, model, message, settings.timeout).await,
                CHAT_ERROR_PREFIX,
            ),
        };

        match result {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!("Backend request to {} failed: {:#}", endpoint, e);
                format!("{}{}", prefix, describe_error(&e))
            }
        }
    }
}
