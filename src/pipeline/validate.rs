//! Upload validation: MIME/size gate enforced before anything touches the
//! network.
//!
//! The gate works on an [`ImageUpload`] descriptor rather than file contents,
//! so it is synchronous and does no I/O of its own. Building the descriptor
//! from a path costs one metadata stat; the actual bytes are only read later
//! by the encoder, after the upload has passed.

use crate::error::NoteError;
use std::path::Path;

/// MIME types the pipeline accepts.
///
/// `image/jpg` is not a registered type but appears in the wild (and in
/// upload metadata from some browsers), so it is accepted alongside the
/// canonical `image/jpeg`.
pub const ACCEPTED_MIME_TYPES: [&str; 4] =
    ["image/jpeg", "image/png", "image/jpg", "image/webp"];

/// Maximum accepted upload size: 5 MiB.
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// Descriptor of an upload: what the validator needs, nothing more.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    /// Declared MIME type, e.g. `image/png`.
    pub mime_type: String,
    /// Size in bytes.
    pub size_bytes: u64,
}

impl ImageUpload {
    pub fn new(mime_type: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            mime_type: mime_type.into(),
            size_bytes,
        }
    }

    /// Build a descriptor for a file on disk.
    ///
    /// The MIME type is derived from the extension; an unknown extension maps
    /// to `application/octet-stream` and is rejected by [`validate`] with the
    /// same message a wrong image format gets.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, NoteError> {
        let path = path.as_ref();
        let meta = std::fs::metadata(path).map_err(|e| NoteError::Encoding {
            detail: format!("cannot stat '{}': {e}", path.display()),
        })?;
        Ok(Self {
            mime_type: mime_for_path(path).to_string(),
            size_bytes: meta.len(),
        })
    }
}

/// Map a file extension to the MIME type the OCR service expects.
pub fn mime_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Check the upload against the MIME allow-list and the size cap.
///
/// Runs before any network call; a rejected upload never leaves the process.
pub fn validate(upload: &ImageUpload) -> Result<(), NoteError> {
    if !ACCEPTED_MIME_TYPES.contains(&upload.mime_type.as_str()) {
        return Err(NoteError::InvalidImage {
            reason: "Invalid file type. Please upload a JPEG, PNG, or WebP image.".into(),
        });
    }
    if upload.size_bytes > MAX_IMAGE_BYTES {
        return Err(NoteError::InvalidImage {
            reason: "File too large. Maximum size is 5MB.".into(),
        });
    }
    Ok(())
}
