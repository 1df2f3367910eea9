//! Q&A client: answer a follow-up question about an enhanced note.
//!
//! Single-turn by design: the question, the original extracted text, and the
//! prior summary all travel in one user message under the fixed tutor
//! prompt, so the endpoint needs no conversation state. Responses get the
//! same reasoning scrub as the enhancement path.

use crate::config::EnhanceConfig;
use crate::error::NoteError;
use crate::pipeline::llm::{ChatMessage, CompletionClient, CompletionOptions};
use crate::pipeline::postprocess;
use crate::prompts::{question_context, TUTOR_SYSTEM_PROMPT};

/// Sampling used for answers regardless of the enhancement profile; answers
/// are short and should stay close to the supplied material.
const QA_TEMPERATURE: f32 = 0.5;
const QA_MAX_TOKENS: usize = 1024;

/// Client for the question-answering capability.
#[derive(Debug, Clone)]
pub struct QaClient {
    completion: CompletionClient,
    model: String,
}

impl QaClient {
    pub fn new(config: &EnhanceConfig, completion: CompletionClient) -> Self {
        Self {
            completion,
            model: config.model.clone(),
        }
    }

    /// Answer `question` using only the supplied material.
    pub async fn answer(
        &self,
        question: &str,
        original_text: &str,
        summary: &str,
    ) -> Result<String, NoteError> {
        if question.trim().is_empty() {
            return Err(NoteError::EmptyInput);
        }

        let messages = [
            ChatMessage::system(TUTOR_SYSTEM_PROMPT),
            ChatMessage::user(question_context(question, original_text, summary)),
        ];
        let options = CompletionOptions {
            model: self.model.clone(),
            temperature: QA_TEMPERATURE,
            max_tokens: QA_MAX_TOKENS,
        };
        let raw = self.completion.complete(&messages, &options).await?;
        Ok(postprocess::scrub_model_output(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;

    #[tokio::test]
    async fn blank_question_fails_without_network() {
        let config = EnhanceConfig::default();
        let completion = CompletionClient::new(&config, &Credentials::new("k", "k")).unwrap();
        let client = QaClient::new(&config, completion);
        let err = client.answer("  ", "text", "summary").await.unwrap_err();
        assert!(matches!(err, NoteError::EmptyInput));
    }
}
