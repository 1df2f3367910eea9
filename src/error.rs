//! Error types for the notespark library.
//!
//! Every remote-call wrapper maps transport and service failures into one
//! [`NoteError`] variant with a message fit for direct display. The session
//! does not branch on the variant beyond storing the message and halting;
//! callers that need finer handling (retry UIs, credential prompts) can
//! match on the variant instead.

use thiserror::Error;

/// All errors returned by the notespark library.
#[derive(Debug, Error)]
pub enum NoteError {
    // ── Local errors (before any network I/O) ─────────────────────────────
    /// The uploaded file failed the MIME/size gate.
    #[error("{reason}")]
    InvalidImage { reason: String },

    /// Reading or base64-converting the upload failed.
    #[error("Failed to prepare the image: {detail}")]
    Encoding { detail: String },

    /// Text enhancement was requested with nothing to enhance.
    #[error("Please enter some text to enhance.")]
    EmptyInput,

    /// A required credential is not present in the environment.
    #[error("{var} is not set. Export it before running, e.g. export {var}=...")]
    MissingCredential { var: &'static str },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Remote errors ─────────────────────────────────────────────────────
    /// The OCR response carried no usable text.
    #[error("No text could be extracted from the image. Try a clearer photo or enter the text manually.")]
    NoTextFound,

    /// The call exceeded its deadline.
    #[error("Request to the {service} service timed out after {secs}s. Please try again.")]
    Timeout { service: Service, secs: u64 },

    /// The request never produced a response (DNS, connect, TLS).
    #[error("No response from the {service} service. Please check your internet connection.")]
    Transport { service: Service, detail: String },

    /// The service rejected the credentials (401/403).
    #[error("Authentication error from the {service} service. Please check your API key.")]
    Auth { service: Service },

    /// HTTP 429; the caller should back off before retrying.
    #[error("Rate limit exceeded on the {service} service. Please try again later.")]
    RateLimit { service: Service },

    /// HTTP 400 with the remote-supplied message when one was present.
    #[error("Bad request to the {service} service: {message}")]
    BadRequest { service: Service, message: String },

    /// Any other remote rejection or malformed response.
    #[error("{service} service error: {detail}")]
    Service { service: Service, detail: String },
}

/// Which remote collaborator a failure came from.
///
/// Only used for messaging; both services share one taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Ocr,
    Llm,
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Service::Ocr => write!(f, "OCR"),
            Service::Llm => write!(f, "AI"),
        }
    }
}

impl NoteError {
    /// True when the failure happened before any request left the process.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            NoteError::InvalidImage { .. }
                | NoteError::Encoding { .. }
                | NoteError::EmptyInput
                | NoteError::MissingCredential { .. }
                | NoteError::InvalidConfig(_)
        )
    }
}
