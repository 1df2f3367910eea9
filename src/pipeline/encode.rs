//! Image encoding: file bytes → bare base64 payload.
//!
//! The OCR endpoint takes the payload without a data-URL prefix, so the
//! encoder produces the raw base64 string directly instead of building
//! `data:<mime>;base64,...` and stripping it again. The read is a single
//! shot: the whole file (already capped at 5 MiB by the validator) is pulled
//! into memory once and encoded.

use crate::error::NoteError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;
use tracing::debug;

/// Encode raw bytes as a bare base64 payload.
pub fn encode_bytes(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Read a file and encode it as a bare base64 payload.
///
/// Fails with [`NoteError::Encoding`] when the read fails; the validator has
/// already established that the path exists, so a failure here is a genuine
/// I/O problem (permissions, the file vanished) worth its own message.
pub async fn encode_file(path: impl AsRef<Path>) -> Result<String, NoteError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|e| NoteError::Encoding {
        detail: format!("cannot read '{}': {e}", path.display()),
    })?;
    let b64 = encode_bytes(&bytes);
    debug!("Encoded {} bytes → {} bytes base64", bytes.len(), b64.len());
    Ok(b64)
}
