//! The note-enhancement session: pipeline state machine, history, and chat.
//!
//! [`NoteSession`] owns everything a frontend renders: the current
//! [`ProcessingStatus`], the latest extracted text and summary, the
//! most-recent-first history, and the Q&A transcript. It sequences the
//! pipeline stages strictly one after another and never retries; a failed
//! stage stores its message verbatim and halts.
//!
//! ## Stale runs
//!
//! A user can reset (or load a history item) while a run's network calls are
//! still in flight. Nothing aborts those calls; instead every run carries a
//! generation token, and [`NoteSession::finish_run`] discards outcomes whose
//! token is no longer current. State is only ever mutated by the active
//! generation.

use crate::config::{Credentials, EnhanceConfig};
use crate::error::NoteError;
use crate::pipeline::encode;
use crate::pipeline::enhance::EnhanceClient;
use crate::pipeline::llm::{ChatMessage, CompletionClient};
use crate::pipeline::ocr::OcrClient;
use crate::pipeline::qa::QaClient;
use crate::pipeline::validate::{self, ImageUpload};
use crate::prompts::{HISTORY_GREETING, INITIAL_GREETING, QA_FALLBACK};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Where the pipeline currently is.
///
/// Forward-only: `Uploading → Extracting → Summarizing → Complete`, with
/// `Error` reachable from any non-idle state. Only an explicit reset returns
/// to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Idle,
    Uploading,
    Extracting,
    Summarizing,
    Complete,
    Error,
}

impl ProcessingStatus {
    /// Coarse completion percentage for progress displays.
    pub fn progress_percent(self) -> u8 {
        match self {
            ProcessingStatus::Idle => 0,
            ProcessingStatus::Uploading => 20,
            ProcessingStatus::Extracting => 45,
            ProcessingStatus::Summarizing => 75,
            ProcessingStatus::Complete | ProcessingStatus::Error => 100,
        }
    }

    /// `Complete` and `Error` end a run.
    pub fn is_terminal(self) -> bool {
        matches!(self, ProcessingStatus::Complete | ProcessingStatus::Error)
    }

    /// Whether `next` is a legal direct successor of `self`.
    pub fn can_advance_to(self, next: ProcessingStatus) -> bool {
        use ProcessingStatus::*;
        match (self, next) {
            // Error is reachable from any non-idle state; validation failures
            // surface it straight from Idle as the run's first transition.
            (_, Error) => true,
            (Idle, Uploading) => true,
            // Direct text entry skips uploading and extracting.
            (Idle, Summarizing) => true,
            (Uploading, Extracting) => true,
            (Extracting, Summarizing) => true,
            (Summarizing, Complete) => true,
            (Error, Idle) | (Complete, Idle) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProcessingStatus::Idle => "idle",
            ProcessingStatus::Uploading => "uploading",
            ProcessingStatus::Extracting => "extracting",
            ProcessingStatus::Summarizing => "summarizing",
            ProcessingStatus::Complete => "complete",
            ProcessingStatus::Error => "error",
        };
        write!(f, "{s}")
    }
}

/// A completed enhancement, newest first in [`NoteSession::history`].
///
/// In-memory only; nothing here survives the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: Uuid,
    /// Source image path or URL; `None` for direct text entry.
    pub image: Option<String>,
    pub extracted_text: String,
    pub summary: String,
    pub timestamp: DateTime<Utc>,
}

impl HistoryItem {
    /// Short single-line preview of the extracted text for list displays.
    pub fn preview(&self, max_chars: usize) -> String {
        let line = self.extracted_text.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.chars().count() <= max_chars {
            return line;
        }
        let truncated: String = line.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}

/// What a successful pipeline run produced, before it is applied to session
/// state.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub image: Option<String>,
    pub extracted_text: String,
    pub summary: String,
}

/// Identifies one pipeline run for stale-outcome detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunToken {
    generation: u64,
}

/// Whether [`NoteSession::finish_run`] applied an outcome or discarded it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunDisposition {
    Applied,
    /// The session was reset (or a newer run started) after this run began;
    /// its outcome was discarded without touching state.
    Stale,
}

/// A single user's note-enhancement session.
pub struct NoteSession {
    config: EnhanceConfig,
    ocr: OcrClient,
    enhancer: EnhanceClient,
    qa: QaClient,

    status: ProcessingStatus,
    error: Option<String>,
    current_image: Option<String>,
    extracted_text: String,
    summary: String,
    history: Vec<HistoryItem>,
    chat: Vec<ChatMessage>,
    generation: u64,
}

impl NoteSession {
    /// Create a session with credentials from the environment.
    ///
    /// Fails fast with [`NoteError::MissingCredential`] before any network
    /// attempt when a key is absent.
    pub fn new(config: EnhanceConfig) -> Result<Self, NoteError> {
        let credentials = Credentials::from_env()?;
        Self::with_credentials(config, credentials)
    }

    /// Create a session with explicit credentials.
    pub fn with_credentials(
        config: EnhanceConfig,
        credentials: Credentials,
    ) -> Result<Self, NoteError> {
        let completion = CompletionClient::new(&config, &credentials)?;
        Ok(Self {
            ocr: OcrClient::new(&config, &credentials)?,
            enhancer: EnhanceClient::new(&config, completion.clone()),
            qa: QaClient::new(&config, completion),
            config,
            status: ProcessingStatus::Idle,
            error: None,
            current_image: None,
            extracted_text: String::new(),
            summary: String::new(),
            history: Vec::new(),
            chat: Vec::new(),
            generation: 0,
        })
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn status(&self) -> ProcessingStatus {
        self.status
    }

    /// The stored failure message, present exactly when status is `Error`.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn current_image(&self) -> Option<&str> {
        self.current_image.as_deref()
    }

    pub fn extracted_text(&self) -> &str {
        &self.extracted_text
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Completed runs, most recent first.
    pub fn history(&self) -> &[HistoryItem] {
        &self.history
    }

    /// The Q&A transcript for the current result.
    pub fn chat(&self) -> &[ChatMessage] {
        &self.chat
    }

    // ── Pipeline runs ─────────────────────────────────────────────────────

    /// Run the full image pipeline: validate → encode → extract → enhance.
    ///
    /// On success the session is `Complete`, a [`HistoryItem`] has been
    /// prepended, and the chat is seeded with the assistant greeting. On any
    /// failure the session is `Error` with the failure's message stored
    /// verbatim; no stage is retried.
    pub async fn process_image(&mut self, path: impl AsRef<Path>) -> Result<HistoryItem, NoteError> {
        let path = path.as_ref();
        let _token = self.start_run();
        info!(path = %path.display(), "Processing image upload");

        match self.drive_image(path).await {
            Ok(outcome) => Ok(self.apply_success(outcome)),
            Err(e) => {
                self.apply_failure(e.to_string());
                Err(e)
            }
        }
    }

    /// Direct text entry: skip upload and extraction, enhance immediately.
    pub async fn process_text(&mut self, text: &str) -> Result<HistoryItem, NoteError> {
        let _token = self.start_run();

        let result = async {
            if text.trim().is_empty() {
                return Err(NoteError::EmptyInput);
            }
            self.advance(ProcessingStatus::Summarizing);
            let summary = self.enhancer.enhance(text).await?;
            Ok(PipelineOutcome {
                image: None,
                extracted_text: text.to_string(),
                summary,
            })
        }
        .await;

        match result {
            Ok(outcome) => Ok(self.apply_success(outcome)),
            Err(e) => {
                self.apply_failure(e.to_string());
                Err(e)
            }
        }
    }

    /// Begin a run and obtain its token.
    ///
    /// Starting a run is an explicit user action: it supersedes any earlier
    /// run and re-baselines the status to `Idle` before the first stage.
    /// For hosts that drive the pipeline clients themselves and apply the
    /// result later via [`finish_run`]; `process_image`/`process_text` wrap
    /// this for the common case.
    pub fn start_run(&mut self) -> RunToken {
        self.generation += 1;
        self.status = ProcessingStatus::Idle;
        self.error = None;
        if let Some(observer) = &self.config.observer {
            observer.on_run_start();
        }
        RunToken {
            generation: self.generation,
        }
    }

    /// Record an intermediate stage for a manually driven run.
    ///
    /// Ignored (returns [`RunDisposition::Stale`]) when the token has been
    /// superseded, so a late stage event cannot resurrect a reset session.
    pub fn note_stage(&mut self, token: RunToken, status: ProcessingStatus) -> RunDisposition {
        if token.generation != self.generation {
            return RunDisposition::Stale;
        }
        self.advance(status);
        RunDisposition::Applied
    }

    /// Apply a run outcome, unless the run has been superseded.
    pub fn finish_run(
        &mut self,
        token: RunToken,
        outcome: Result<PipelineOutcome, NoteError>,
    ) -> RunDisposition {
        if token.generation != self.generation {
            debug!(
                run = token.generation,
                current = self.generation,
                "Discarding stale pipeline outcome"
            );
            return RunDisposition::Stale;
        }
        match outcome {
            Ok(o) => {
                self.apply_success(o);
            }
            Err(e) => self.apply_failure(e.to_string()),
        }
        RunDisposition::Applied
    }

    /// Ask a follow-up question about the current result.
    ///
    /// The user turn is always appended. On success the assistant's answer
    /// is appended and returned; on failure the transcript receives the
    /// fallback apology turn and the error propagates to the caller.
    pub async fn ask(&mut self, question: &str) -> Result<String, NoteError> {
        self.chat.push(ChatMessage::user(question));
        match self
            .qa
            .answer(question, &self.extracted_text, &self.summary)
            .await
        {
            Ok(answer) => {
                self.chat.push(ChatMessage::assistant(answer.clone()));
                Ok(answer)
            }
            Err(e) => {
                warn!("Q&A call failed: {e}");
                self.chat.push(ChatMessage::assistant(QA_FALLBACK));
                Err(e)
            }
        }
    }

    /// Restore a stored history item as the current result.
    ///
    /// Supersedes any in-flight run. Returns `false` when no item has the
    /// given id.
    pub fn select_history(&mut self, id: Uuid) -> bool {
        let Some(item) = self.history.iter().find(|h| h.id == id).cloned() else {
            return false;
        };
        self.generation += 1;
        self.current_image = item.image.clone();
        self.extracted_text = item.extracted_text.clone();
        self.summary = item.summary.clone();
        self.error = None;
        self.status = ProcessingStatus::Complete;
        self.chat = vec![ChatMessage::assistant(HISTORY_GREETING)];
        true
    }

    /// Explicit user reset: back to `Idle`, keeping the history.
    ///
    /// Always supersedes any in-flight run; its outcome will be discarded by
    /// [`finish_run`]. Returns `false` when there was no visible state to
    /// clear.
    pub fn reset(&mut self) -> bool {
        self.generation += 1;
        if self.status == ProcessingStatus::Idle {
            return false;
        }
        self.status = ProcessingStatus::Idle;
        self.error = None;
        self.current_image = None;
        self.extracted_text.clear();
        self.summary.clear();
        self.chat.clear();
        true
    }

    // ── Internals ─────────────────────────────────────────────────────────

    async fn drive_image(&mut self, path: &Path) -> Result<PipelineOutcome, NoteError> {
        let upload = ImageUpload::from_path(path)?;
        validate::validate(&upload)?;

        self.advance(ProcessingStatus::Uploading);
        let payload = encode::encode_file(path).await?;

        self.advance(ProcessingStatus::Extracting);
        let extraction = self.ocr.extract_base64(&payload).await?;

        self.advance(ProcessingStatus::Summarizing);
        let summary = self.enhancer.enhance(&extraction.text).await?;

        Ok(PipelineOutcome {
            image: Some(path.display().to_string()),
            extracted_text: extraction.text,
            summary,
        })
    }

    fn advance(&mut self, next: ProcessingStatus) {
        debug_assert!(
            self.status.can_advance_to(next),
            "illegal status transition {} → {next}",
            self.status
        );
        debug!(from = %self.status, to = %next, "Status transition");
        self.status = next;
        if let Some(observer) = &self.config.observer {
            observer.on_stage(next);
        }
    }

    fn apply_success(&mut self, outcome: PipelineOutcome) -> HistoryItem {
        let item = HistoryItem {
            id: Uuid::new_v4(),
            image: outcome.image.clone(),
            extracted_text: outcome.extracted_text.clone(),
            summary: outcome.summary.clone(),
            timestamp: Utc::now(),
        };

        self.current_image = outcome.image;
        self.extracted_text = outcome.extracted_text;
        self.summary = outcome.summary;
        self.error = None;
        self.history.insert(0, item.clone());
        self.chat = vec![ChatMessage::assistant(INITIAL_GREETING)];
        // Terminal application, not a driver stage: manually driven runs
        // land here from whatever stage the host last reported.
        self.status = ProcessingStatus::Complete;
        if let Some(observer) = &self.config.observer {
            observer.on_stage(ProcessingStatus::Complete);
        }

        if let Some(observer) = &self.config.observer {
            observer.on_run_complete(self.summary.len());
        }
        info!("Run complete, {} history items", self.history.len());
        item
    }

    fn apply_failure(&mut self, message: String) {
        warn!("Run failed: {message}");
        if let Some(observer) = &self.config.observer {
            observer.on_run_error(&message);
        }
        self.error = Some(message);
        self.status = ProcessingStatus::Error;
        if let Some(observer) = &self.config.observer {
            observer.on_stage(ProcessingStatus::Error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_session() -> NoteSession {
        NoteSession::with_credentials(
            EnhanceConfig::default(),
            Credentials::new("ocr-key", "llm-key"),
        )
        .unwrap()
    }

    fn sample_outcome() -> PipelineOutcome {
        PipelineOutcome {
            image: Some("board.png".into()),
            extracted_text: "Newton's first law".into(),
            summary: "Objects keep doing what they're doing.".into(),
        }
    }

    #[test]
    fn new_session_is_idle_and_empty() {
        let s = offline_session();
        assert_eq!(s.status(), ProcessingStatus::Idle);
        assert!(s.history().is_empty());
        assert!(s.chat().is_empty());
        assert!(s.error_message().is_none());
    }

    #[test]
    fn progress_percent_is_monotonic_over_the_happy_path() {
        use ProcessingStatus::*;
        let path = [Idle, Uploading, Extracting, Summarizing, Complete];
        let percents: Vec<u8> = path.iter().map(|s| s.progress_percent()).collect();
        let mut sorted = percents.clone();
        sorted.sort_unstable();
        assert_eq!(percents, sorted);
        assert_eq!(Complete.progress_percent(), 100);
    }

    #[test]
    fn transition_table_is_forward_only() {
        use ProcessingStatus::*;
        assert!(Idle.can_advance_to(Uploading));
        assert!(Idle.can_advance_to(Summarizing));
        assert!(Uploading.can_advance_to(Extracting));
        assert!(Extracting.can_advance_to(Summarizing));
        assert!(Summarizing.can_advance_to(Complete));
        assert!(Extracting.can_advance_to(Error));
        assert!(Error.can_advance_to(Idle));
        assert!(Complete.can_advance_to(Idle));

        assert!(!Complete.can_advance_to(Uploading));
        assert!(!Summarizing.can_advance_to(Extracting));
        assert!(!Extracting.can_advance_to(Uploading));
        assert!(!Idle.can_advance_to(Complete));
    }

    #[tokio::test]
    async fn blank_direct_text_fails_without_network() {
        let mut s = offline_session();
        let err = s.process_text("   ").await.unwrap_err();
        assert!(matches!(err, NoteError::EmptyInput));
        assert_eq!(s.status(), ProcessingStatus::Error);
        assert_eq!(s.error_message(), Some("Please enter some text to enhance."));
        assert!(s.history().is_empty());
    }

    #[tokio::test]
    async fn invalid_upload_fails_before_uploading_stage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.gif");
        std::fs::write(&path, b"GIF89a").unwrap();

        let mut s = offline_session();
        let err = s.process_image(&path).await.unwrap_err();
        assert!(matches!(err, NoteError::InvalidImage { .. }));
        assert_eq!(s.status(), ProcessingStatus::Error);
        assert!(s.error_message().unwrap().contains("Invalid file type"));
    }

    #[test]
    fn finish_run_applies_current_outcome() {
        let mut s = offline_session();
        let token = s.start_run();
        let disposition = s.finish_run(token, Ok(sample_outcome()));
        assert_eq!(disposition, RunDisposition::Applied);
        assert_eq!(s.status(), ProcessingStatus::Complete);
        assert_eq!(s.history().len(), 1);
        assert_eq!(s.chat().len(), 1);
        assert_eq!(s.chat()[0].content, crate::prompts::INITIAL_GREETING);
    }

    #[test]
    fn finish_run_discards_outcome_after_reset() {
        let mut s = offline_session();
        let token = s.start_run();
        // User starts over while the run is still in flight.
        s.reset();
        let disposition = s.finish_run(token, Ok(sample_outcome()));
        assert_eq!(disposition, RunDisposition::Stale);
        assert_eq!(s.status(), ProcessingStatus::Idle);
        assert!(s.history().is_empty());
        assert!(s.summary().is_empty());
    }

    #[test]
    fn finish_run_discards_outcome_after_newer_run_started() {
        let mut s = offline_session();
        let old = s.start_run();
        let newer = s.start_run();
        assert_eq!(s.finish_run(old, Ok(sample_outcome())), RunDisposition::Stale);
        assert_eq!(s.finish_run(newer, Ok(sample_outcome())), RunDisposition::Applied);
        assert_eq!(s.history().len(), 1);
    }

    #[test]
    fn note_stage_is_ignored_for_stale_tokens() {
        let mut s = offline_session();
        let token = s.start_run();
        s.reset();
        assert_eq!(
            s.note_stage(token, ProcessingStatus::Uploading),
            RunDisposition::Stale
        );
        assert_eq!(s.status(), ProcessingStatus::Idle);
    }

    #[test]
    fn note_stage_drives_a_manual_run() {
        let mut s = offline_session();
        let token = s.start_run();
        assert_eq!(
            s.note_stage(token, ProcessingStatus::Uploading),
            RunDisposition::Applied
        );
        assert_eq!(s.status(), ProcessingStatus::Uploading);
        s.note_stage(token, ProcessingStatus::Extracting);
        s.note_stage(token, ProcessingStatus::Summarizing);
        s.finish_run(token, Ok(sample_outcome()));
        assert_eq!(s.status(), ProcessingStatus::Complete);
    }

    #[test]
    fn failed_outcome_stores_message_verbatim() {
        let mut s = offline_session();
        let token = s.start_run();
        let disposition = s.finish_run(token, Err(NoteError::NoTextFound));
        assert_eq!(disposition, RunDisposition::Applied);
        assert_eq!(s.status(), ProcessingStatus::Error);
        assert_eq!(
            s.error_message(),
            Some(NoteError::NoTextFound.to_string().as_str())
        );
    }

    #[test]
    fn reset_clears_current_state_but_keeps_history() {
        let mut s = offline_session();
        let token = s.start_run();
        s.finish_run(token, Ok(sample_outcome()));
        assert!(s.reset());
        assert_eq!(s.status(), ProcessingStatus::Idle);
        assert!(s.summary().is_empty());
        assert!(s.chat().is_empty());
        assert_eq!(s.history().len(), 1);
    }

    #[test]
    fn reset_from_idle_is_a_no_op() {
        let mut s = offline_session();
        assert!(!s.reset());
    }

    #[test]
    fn select_history_restores_item_and_seeds_chat() {
        let mut s = offline_session();
        let token = s.start_run();
        s.finish_run(token, Ok(sample_outcome()));
        let id = s.history()[0].id;
        s.reset();

        assert!(s.select_history(id));
        assert_eq!(s.status(), ProcessingStatus::Complete);
        assert_eq!(s.extracted_text(), "Newton's first law");
        assert_eq!(s.chat()[0].content, crate::prompts::HISTORY_GREETING);
    }

    #[test]
    fn select_history_with_unknown_id_is_refused() {
        let mut s = offline_session();
        assert!(!s.select_history(Uuid::new_v4()));
        assert_eq!(s.status(), ProcessingStatus::Idle);
    }

    #[test]
    fn history_is_most_recent_first() {
        let mut s = offline_session();
        let t1 = s.start_run();
        s.finish_run(t1, Ok(sample_outcome()));
        let t2 = s.start_run();
        let mut second = sample_outcome();
        second.extracted_text = "Second upload".into();
        s.finish_run(t2, Ok(second));

        assert_eq!(s.history()[0].extracted_text, "Second upload");
        assert_eq!(s.history()[1].extracted_text, "Newton's first law");
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        let item = HistoryItem {
            id: Uuid::new_v4(),
            image: None,
            extracted_text: "many   words\nacross  lines that keep going".into(),
            summary: String::new(),
            timestamp: Utc::now(),
        };
        assert_eq!(item.preview(10), "many words...");
        assert_eq!(item.preview(1000), "many words across lines that keep going");
    }
}
