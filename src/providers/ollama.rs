//! Ollama wire formats
//!
//! Both the `/api/generate` and `/api/chat` endpoints are called with
//! `stream: false`, so the whole reply arrives as one JSON object.

use super::base::{NO_CHAT_MESSAGE_SENTINEL, NO_GENERATE_RESPONSE_SENTINEL};
use crate::error::{Result, VaporError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Request body for `/api/generate`
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// Response body from `/api/generate`
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    done: Option<bool>,
    #[serde(default)]
    eval_count: Option<u64>,
    #[serde(default)]
    total_duration: Option<u64>,
}

/// Outgoing chat message
#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Message returned by the chat API; only `content` is read
#[derive(Debug, Deserialize)]
struct ChatReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Request body for `/api/chat`
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

/// Response body from `/api/chat`
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<ChatReplyMessage>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    done: Option<bool>,
    #[serde(default)]
    eval_count: Option<u64>,
    #[serde(default)]
    total_duration: Option<u64>,
}

async fn post<Req, Resp>(client: &Client, endpoint: &str, body: &Req, timeout: Duration) -> Result<Resp>
where
    Req: Serialize + ?Sized,
    Resp: for<'de> Deserialize<'de>,
{
    let response = client
        .post(endpoint)
        .timeout(timeout)
        .json(body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        tracing::warn!("Ollama returned status {}", status);
    }

    Ok(response.json().await?)
}

/// Call `/api/generate` and return `response`
///
/// # Errors
///
/// Returns an error on transport or decoding failure, or when Ollama
/// answers with an `error` field and no response.
pub async fn generate(
    client: &Client,
    endpoint: &str,
    model: &str,
    message: &str,
    timeout: Duration,
) -> Result<String> {
    let request = GenerateRequest {
        model,
        prompt: message,
        stream: false,
    };
    let reply: GenerateResponse = post(client, endpoint, &request, timeout).await?;

    tracing::debug!(
        done = ?reply.done,
        eval_count = ?reply.eval_count,
        total_duration = ?reply.total_duration,
        "Ollama generate completed"
    );

    match (reply.response, reply.error) {
        (Some(text), _) => Ok(text),
        (None, Some(error)) => Err(VaporError::Backend(error).into()),
        (None, None) => Ok(NO_GENERATE_RESPONSE_SENTINEL.to_string()),
    }
}

/// Call `/api/chat` with a single user message and return `message.content`
///
/// # Errors
///
/// Returns an error on transport or decoding failure, or when Ollama
/// answers with an `error` field and no message.
pub async fn chat(
    client: &Client,
    endpoint: &str,
    model: &str,
    message: &str,
    timeout: Duration,
) -> Result<String> {
    let request = ChatRequest {
        model,
        messages: vec![ChatMessage {
            role: "user",
            content: message,
        }],
        stream: false,
    };
    let reply: ChatResponse = post(client, endpoint, &request, timeout).await?;

    tracing::debug!(
        done = ?reply.done,
        eval_count = ?reply.eval_count,
        total_duration = ?reply.total_duration,
        "Ollama chat completed"
    );

    match (reply.message.and_then(|m| m.content), reply.error) {
        (Some(text), _) => Ok(text),
        (None, Some(error)) => Err(VaporError::Backend(error).into()),
        (None, None) => Ok(NO_CHAT_MESSAGE_SENTINEL.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generate_request_shape() {
        let request = GenerateRequest {
            model: "llama3.2",
            prompt: "hello",
            stream: false,
        };
        assert_eq!(
            serde_json::to_value(request).unwrap(),
            json!({"model": "llama3.2", "prompt": "hello", "stream": false})
        );
    }

    #[test]
    fn test_chat_request_shape() {
        let request = ChatRequest {
            model: "llama3.2",
            messages: vec![ChatMessage {
                role: "user",
                content: "hello",
            }],
            stream: false,
        };
        assert_eq!(
            serde_json::to_value(request).unwrap(),
            json!({
                "model": "llama3.2",
                "messages": [{"role": "user", "content": "hello"}],
                "stream": false
            })
        );
    }

    #[test]
    fn test_generate_response_tolerates_missing_fields() {
        let reply: GenerateResponse = serde_json::from_value(json!({"model": "m"})).unwrap();
        assert!(reply.response.is_none());
        assert!(reply.done.is_none());
    }

    #[test]
    fn test_chat_response_full_body() {
        let reply: ChatResponse = serde_json::from_value(json!({
            "model": "llama3.2",
            "created_at": "2024-01-01T00:00:00Z",
            "message": {"role": "assistant", "content": "hi there"},
            "done": true,
            "done_reason": "stop",
            "total_duration": 100,
            "load_duration": 1,
            "prompt_eval_count": 3,
            "prompt_eval_duration": 4,
            "eval_count": 5,
            "eval_duration": 6
        }))
        .unwrap();
        assert_eq!(
            reply.message.and_then(|m| m.content).as_deref(),
            Some("hi there")
        );
        assert_eq!(reply.eval_count, Some(5));
    }

    #[test]
    fn test_chat_response_message_without_role() {
        let reply: ChatResponse =
            serde_json::from_value(json!({"message": {"content": "hi!"}})).unwrap();
        assert_eq!(
            reply.message.and_then(|m| m.content).as_deref(),
            Some("hi!")
        );
    }

    #[test]
    fn test_generate_response_null_telemetry() {
        let reply: GenerateResponse = serde_json::from_value(json!({
            "response": "ok",
            "eval_count": null,
            "total_duration": null,
            "done": null
        }))
        .unwrap();
        assert_eq!(reply.response.as_deref(), Some("ok"));
        assert!(reply.eval_count.is_none());
    }
}
