//! # notespark
//!
//! Turn a photo of handwritten or whiteboard notes into an enhanced,
//! study-friendly summary, then answer follow-up questions about it.
//!
//! ## Why this crate?
//!
//! Classroom photos are easy to take and painful to use: the text is locked
//! in pixels and the content is unstructured. This crate orchestrates two
//! remote services, an OCR endpoint and a chat-completions endpoint, into
//! one sequential pipeline with explicit status reporting, a single error
//! taxonomy for user messaging, and the annotation logic (glossary terms,
//! user highlights) a frontend needs to make the result interactive.
//!
//! ## Pipeline Overview
//!
//! ```text
//! image file
//!  │
//!  ├─ 1. Validate  MIME/size gate, no I/O
//!  ├─ 2. Encode    single-shot read → bare base64
//!  ├─ 3. Extract   OCR endpoint (30 s timeout)
//!  ├─ 4. Enhance   chat endpoint + persona prompt (60 s timeout)
//!  ├─ 5. Scrub     strip <think>…</think> reasoning, tidy whitespace
//!  └─ 6. Apply     status → complete, history prepended, chat seeded
//! ```
//!
//! Direct text entry joins at step 4. Q&A reuses the chat endpoint with a
//! tutor prompt over the extracted text and summary.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use notespark::{EnhanceConfig, NoteSession};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Credentials from RAPIDAPI_KEY and GROQ_API_KEY.
//!     let mut session = NoteSession::new(EnhanceConfig::default())?;
//!     let item = session.process_image("whiteboard.jpg").await?;
//!     println!("{}", item.summary);
//!
//!     let answer = session.ask("What does the second bullet mean?").await?;
//!     println!("{answer}");
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `notespark` binary (clap + anyhow + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! notespark = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod annotate;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use annotate::glossary::{Glossary, GlossarySegment, GlossaryTerm};
pub use annotate::highlight::{
    Highlight, HighlightSet, InsertOutcome, TextSegment, HIGHLIGHT_PALETTE,
};
pub use config::{Credentials, EnhanceConfig, EnhanceConfigBuilder, PromptProfile};
pub use error::{NoteError, Service};
pub use pipeline::llm::{ChatMessage, ChatRole};
pub use progress::{NoopObserver, Observer, PipelineObserver};
pub use session::{
    HistoryItem, NoteSession, PipelineOutcome, ProcessingStatus, RunDisposition, RunToken,
};
