//! Enhancement client: rewrite extracted text as a study-friendly summary.
//!
//! A thin wrapper over [`CompletionClient`]: it owns the precondition (no
//! blank input on the wire), the profile-driven sampling options, and the
//! mandatory scrub of the response. Prompt text lives in [`crate::prompts`].

use crate::config::EnhanceConfig;
use crate::error::NoteError;
use crate::pipeline::llm::{ChatMessage, CompletionClient, CompletionOptions};
use crate::pipeline::postprocess;
use crate::prompts::ENHANCE_SYSTEM_PROMPT;
use tracing::info;

/// Client for the enhancement capability.
#[derive(Debug, Clone)]
pub struct EnhanceClient {
    completion: CompletionClient,
    options: CompletionOptions,
    system_prompt: String,
}

impl EnhanceClient {
    pub fn new(config: &EnhanceConfig, completion: CompletionClient) -> Self {
        Self {
            completion,
            options: CompletionOptions {
                model: config.model.clone(),
                temperature: config.effective_temperature(),
                max_tokens: config.effective_max_tokens(),
            },
            system_prompt: config
                .system_prompt
                .clone()
                .unwrap_or_else(|| ENHANCE_SYSTEM_PROMPT.to_string()),
        }
    }

    /// Enhance a block of text into a structured summary.
    ///
    /// Blank input fails with [`NoteError::EmptyInput`] before any network
    /// call. Every successful response passes through the reasoning scrub.
    pub async fn enhance(&self, text: &str) -> Result<String, NoteError> {
        if text.trim().is_empty() {
            return Err(NoteError::EmptyInput);
        }

        let messages = [
            ChatMessage::system(&self.system_prompt),
            ChatMessage::user(text),
        ];
        let raw = self.completion.complete(&messages, &self.options).await?;
        let summary = postprocess::scrub_model_output(&raw);
        info!("Enhanced {} chars into {} chars", text.len(), summary.len());
        Ok(summary)
    }
}
