//! Chat-completions transport shared by the enhancement and Q&A clients.
//!
//! This module is intentionally thin: it owns the wire types, the bearer
//! header, the timeout, and the status-code error mapping. What to say lives
//! in [`crate::prompts`]; what to do with the reply lives in the callers.
//! The original service carried two near-identical copies of this plumbing;
//! here both remote capabilities go through one client configured by
//! endpoint and options.

use crate::config::{Credentials, EnhanceConfig};
use crate::error::{NoteError, Service};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Speaker of a chat turn.
///
/// A closed enum rather than a string: the serializer can only ever emit the
/// three roles the endpoint understands, and rendering code can match
/// exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One chat turn; doubles as the wire shape for the `messages` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Per-call sampling options.
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: usize,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: usize,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

/// Client for the chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    timeout_secs: u64,
}

impl CompletionClient {
    /// Build a client from config and credentials.
    ///
    /// The timeout is enforced at the HTTP-client layer; the session never
    /// races its own timer against a call.
    pub fn new(config: &EnhanceConfig, credentials: &Credentials) -> Result<Self, NoteError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.chat_timeout_secs))
            .build()
            .map_err(|e| NoteError::Transport {
                service: Service::Llm,
                detail: e.to_string(),
            })?;
        Ok(Self {
            http,
            endpoint: config.chat_endpoint.clone(),
            api_key: credentials.llm_key().to_string(),
            timeout_secs: config.chat_timeout_secs,
        })
    }

    /// Send one completion request and return the raw assistant content.
    ///
    /// Callers run the mandatory reasoning strip on the result; this layer
    /// hands back exactly what the endpoint produced.
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<String, NoteError> {
        let body = ChatRequest {
            model: &options.model,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        debug!(
            model = %options.model,
            turns = messages.len(),
            "Sending chat completion request"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "Chat endpoint rejected the request");
            return Err(map_status_error(Service::Llm, status, &body));
        }

        let parsed: ChatResponse =
            response.json().await.map_err(|e| NoteError::Service {
                service: Service::Llm,
                detail: format!("invalid response body: {e}"),
            })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();
        if content.is_empty() {
            return Err(NoteError::Service {
                service: Service::Llm,
                detail: "no content received".into(),
            });
        }
        Ok(content)
    }

    fn map_send_error(&self, e: reqwest::Error) -> NoteError {
        if e.is_timeout() {
            NoteError::Timeout {
                service: Service::Llm,
                secs: self.timeout_secs,
            }
        } else {
            NoteError::Transport {
                service: Service::Llm,
                detail: e.to_string(),
            }
        }
    }
}

/// Map a non-2xx status plus response body into the error taxonomy.
///
/// Shared with the OCR client so both services distinguish the same cases
/// for user messaging.
pub(crate) fn map_status_error(
    service: Service,
    status: reqwest::StatusCode,
    body: &str,
) -> NoteError {
    use reqwest::StatusCode;
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => NoteError::Auth { service },
        StatusCode::TOO_MANY_REQUESTS => NoteError::RateLimit { service },
        StatusCode::BAD_REQUEST => NoteError::BadRequest {
            service,
            message: remote_message(body)
                .unwrap_or_else(|| "Invalid request parameters".to_string()),
        },
        _ => NoteError::Service {
            service,
            detail: format!(
                "HTTP {} - {}",
                status.as_u16(),
                remote_message(body).unwrap_or_else(|| "Unknown error".to_string())
            ),
        },
    }
}

/// Pull the human-readable message out of an error body, if any.
///
/// Accepts both `{"error": {"message": ...}}` and `{"message": ...}` shapes.
fn remote_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let msg = value
        .get("error")
        .and_then(|e| e.get("message"))
        .or_else(|| value.get("message"))?
        .as_str()?;
    if msg.is_empty() {
        None
    } else {
        Some(msg.to_string())
    }
}
