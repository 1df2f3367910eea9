//! Pipeline stages for note enhancement.
//!
//! Each submodule implements exactly one transformation step. Keeping stages
//! separate makes each independently testable and lets the session compose
//! them without any stage knowing about session state.
//!
//! ## Data Flow
//!
//! ```text
//! validate ──▶ encode ──▶ ocr ──▶ enhance ──▶ postprocess
//! (MIME/size)  (base64)   (text)  (summary)   (reasoning strip)
//!                                    │
//!                          qa ◀──────┘ (question + text + summary)
//! ```
//!
//! 1. [`validate`] — gate the upload on MIME type and size, no I/O
//! 2. [`encode`]   — single-shot async read to a bare base64 payload
//! 3. [`ocr`]      — submit the image to the text-extraction endpoint
//! 4. [`llm`]      — chat-completions transport shared by enhancement and Q&A
//! 5. [`enhance`]  — persona-prompted rewrite of the extracted text
//! 6. [`qa`]       — single-turn tutor answer over text + summary
//! 7. [`postprocess`] — mandatory reasoning strip and whitespace tidy

pub mod encode;
pub mod enhance;
pub mod llm;
pub mod ocr;
pub mod postprocess;
pub mod qa;
pub mod validate;
