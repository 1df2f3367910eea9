//! Configuration types for the note-enhancement pipeline.
//!
//! All pipeline behaviour is controlled through [`EnhanceConfig`], built via
//! its [`EnhanceConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share a config between the session and the individual clients
//! and to point the remote endpoints at a mock server in tests.
//!
//! The original service exposed two near-identical enhancement calls that
//! differed only in sampling settings. They survive here as explicit
//! [`PromptProfile`] values the caller chooses between, instead of duplicate
//! code paths.

use crate::error::NoteError;
use crate::progress::PipelineObserver;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Default chat model used by both profiles.
pub const DEFAULT_MODEL: &str = "deepseek-r1-distill-llama-70b";

/// Default OCR extraction endpoint.
pub const DEFAULT_OCR_ENDPOINT: &str = "https://ocr-extract-text.p.rapidapi.com/ocr";

/// Default chat-completions endpoint.
pub const DEFAULT_CHAT_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Environment variable holding the OCR service key.
pub const OCR_KEY_VAR: &str = "RAPIDAPI_KEY";

/// Environment variable holding the LLM bearer token.
pub const LLM_KEY_VAR: &str = "GROQ_API_KEY";

/// Sampling profile for the enhancement call.
///
/// `Summary` favours short, deterministic output; `Enhance` allows a longer,
/// more exploratory rewrite. Both use [`DEFAULT_MODEL`] unless the config
/// overrides the model id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptProfile {
    /// Concise summary: temperature 0.3, 1024 output tokens.
    Summary,
    /// Full enhancement: temperature 0.5, 2048 output tokens. (default)
    #[default]
    Enhance,
}

impl PromptProfile {
    pub fn temperature(self) -> f32 {
        match self {
            PromptProfile::Summary => 0.3,
            PromptProfile::Enhance => 0.5,
        }
    }

    pub fn max_tokens(self) -> usize {
        match self {
            PromptProfile::Summary => 1024,
            PromptProfile::Enhance => 2048,
        }
    }
}

/// Secrets for the two remote services.
///
/// Resolved from the environment when the session is created, before any
/// network attempt, so a missing token surfaces as a configuration error
/// rather than a remote rejection.
#[derive(Clone)]
pub struct Credentials {
    ocr_key: String,
    llm_key: String,
}

impl Credentials {
    /// Build credentials from explicit values (tests, embedding hosts).
    pub fn new(ocr_key: impl Into<String>, llm_key: impl Into<String>) -> Self {
        Self {
            ocr_key: ocr_key.into(),
            llm_key: llm_key.into(),
        }
    }

    /// Read [`OCR_KEY_VAR`] and [`LLM_KEY_VAR`] from the environment.
    ///
    /// An unset or empty variable is an error; requests signed with an empty
    /// key are guaranteed to be rejected remotely anyway.
    pub fn from_env() -> Result<Self, NoteError> {
        let ocr_key = non_empty_var(OCR_KEY_VAR)?;
        let llm_key = non_empty_var(LLM_KEY_VAR)?;
        Ok(Self { ocr_key, llm_key })
    }

    pub fn ocr_key(&self) -> &str {
        &self.ocr_key
    }

    pub fn llm_key(&self) -> &str {
        &self.llm_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key material.
        f.debug_struct("Credentials")
            .field("ocr_key", &"<redacted>")
            .field("llm_key", &"<redacted>")
            .finish()
    }
}

fn non_empty_var(var: &'static str) -> Result<String, NoteError> {
    match std::env::var(var) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(NoteError::MissingCredential { var }),
    }
}

/// Configuration for a note-enhancement session.
///
/// Built via [`EnhanceConfig::builder()`] or [`EnhanceConfig::default()`].
///
/// # Example
/// ```rust
/// use notespark::{EnhanceConfig, PromptProfile};
///
/// let config = EnhanceConfig::builder()
///     .profile(PromptProfile::Summary)
///     .chat_timeout_secs(90)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct EnhanceConfig {
    /// Sampling profile for the enhancement call. Default: [`PromptProfile::Enhance`].
    pub profile: PromptProfile,

    /// Chat model id. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Sampling temperature override. If `None`, the profile's value is used.
    pub temperature: Option<f32>,

    /// Output-token cap override. If `None`, the profile's value is used.
    ///
    /// Setting this too low truncates the summary mid-sentence; the profile
    /// defaults cover dense whiteboard photos comfortably.
    pub max_tokens: Option<usize>,

    /// Custom enhancement system prompt. If `None`, uses the built-in default.
    pub system_prompt: Option<String>,

    /// OCR endpoint URL. Default: [`DEFAULT_OCR_ENDPOINT`].
    pub ocr_endpoint: String,

    /// Chat-completions endpoint URL. Default: [`DEFAULT_CHAT_ENDPOINT`].
    pub chat_endpoint: String,

    /// Per-call OCR timeout in seconds. Default: 30.
    pub ocr_timeout_secs: u64,

    /// Per-call chat timeout in seconds, shared by enhancement and Q&A.
    /// Default: 60.
    pub chat_timeout_secs: u64,

    /// Observer receiving stage-change events. Default: none.
    pub observer: Option<Arc<dyn PipelineObserver>>,
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            profile: PromptProfile::default(),
            model: DEFAULT_MODEL.to_string(),
            temperature: None,
            max_tokens: None,
            system_prompt: None,
            ocr_endpoint: DEFAULT_OCR_ENDPOINT.to_string(),
            chat_endpoint: DEFAULT_CHAT_ENDPOINT.to_string(),
            ocr_timeout_secs: 30,
            chat_timeout_secs: 60,
            observer: None,
        }
    }
}

impl fmt::Debug for EnhanceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnhanceConfig")
            .field("profile", &self.profile)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("ocr_endpoint", &self.ocr_endpoint)
            .field("chat_endpoint", &self.chat_endpoint)
            .field("ocr_timeout_secs", &self.ocr_timeout_secs)
            .field("chat_timeout_secs", &self.chat_timeout_secs)
            .field("observer", &self.observer.as_ref().map(|_| "<dyn PipelineObserver>"))
            .finish()
    }
}

impl EnhanceConfig {
    /// Create a new builder for `EnhanceConfig`.
    pub fn builder() -> EnhanceConfigBuilder {
        EnhanceConfigBuilder {
            config: Self::default(),
        }
    }

    /// Effective sampling temperature (override or profile default).
    pub fn effective_temperature(&self) -> f32 {
        self.temperature.unwrap_or_else(|| self.profile.temperature())
    }

    /// Effective output-token cap (override or profile default).
    pub fn effective_max_tokens(&self) -> usize {
        self.max_tokens.unwrap_or_else(|| self.profile.max_tokens())
    }
}

/// Builder for [`EnhanceConfig`].
#[derive(Debug)]
pub struct EnhanceConfigBuilder {
    config: EnhanceConfig,
}

impl EnhanceConfigBuilder {
    pub fn profile(mut self, profile: PromptProfile) -> Self {
        self.config.profile = profile;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = Some(n);
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn ocr_endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.ocr_endpoint = url.into();
        self
    }

    pub fn chat_endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.chat_endpoint = url.into();
        self
    }

    pub fn ocr_timeout_secs(mut self, secs: u64) -> Self {
        self.config.ocr_timeout_secs = secs.max(1);
        self
    }

    pub fn chat_timeout_secs(mut self, secs: u64) -> Self {
        self.config.chat_timeout_secs = secs.max(1);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.config.observer = Some(observer);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<EnhanceConfig, NoteError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(NoteError::InvalidConfig("Model id must not be empty".into()));
        }
        for (name, url) in [("OCR", &c.ocr_endpoint), ("chat", &c.chat_endpoint)] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(NoteError::InvalidConfig(format!(
                    "{name} endpoint must be an HTTP(S) URL, got '{url}'"
                )));
            }
        }
        if let Some(n) = c.max_tokens {
            if n == 0 {
                return Err(NoteError::InvalidConfig("max_tokens must be ≥ 1".into()));
            }
        }
        Ok(self.config)
    }
}
