//! OCR client: submit an image to the text-extraction endpoint.
//!
//! The endpoint accepts two encodings of the same request: a URL-encoded
//! `base64` field or a `multipart/form-data` upload with an `image` field.
//! Both entry points share one request/response path so the timeout, header
//! and error-mapping behaviour cannot drift apart.
//!
//! The service authenticates with a key/host header pair; the host value is
//! derived from the configured endpoint so pointing the client at a mock
//! server in tests needs no extra knob.

use crate::config::{Credentials, EnhanceConfig};
use crate::error::{NoteError, Service};
use crate::pipeline::llm::map_status_error;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// A successful extraction: the text plus whatever metadata the service
/// returned alongside it (confidence, language, block layout).
#[derive(Debug, Clone)]
pub struct OcrExtraction {
    /// The extracted text, guaranteed non-blank.
    pub text: String,
    /// Remaining response fields, untouched.
    pub metadata: serde_json::Map<String, Value>,
}

/// Client for the OCR endpoint.
#[derive(Debug, Clone)]
pub struct OcrClient {
    http: reqwest::Client,
    endpoint: String,
    host: String,
    api_key: String,
    timeout_secs: u64,
}

impl OcrClient {
    pub fn new(config: &EnhanceConfig, credentials: &Credentials) -> Result<Self, NoteError> {
        let host = reqwest::Url::parse(&config.ocr_endpoint)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .ok_or_else(|| {
                NoteError::InvalidConfig(format!(
                    "OCR endpoint '{}' has no host",
                    config.ocr_endpoint
                ))
            })?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.ocr_timeout_secs))
            .build()
            .map_err(|e| NoteError::Transport {
                service: Service::Ocr,
                detail: e.to_string(),
            })?;
        Ok(Self {
            http,
            endpoint: config.ocr_endpoint.clone(),
            host,
            api_key: credentials.ocr_key().to_string(),
            timeout_secs: config.ocr_timeout_secs,
        })
    }

    /// Extract text from a bare base64 payload.
    ///
    /// An empty payload is rejected locally; the request never leaves the
    /// process.
    pub async fn extract_base64(&self, base64_image: &str) -> Result<OcrExtraction, NoteError> {
        if base64_image.trim().is_empty() {
            return Err(NoteError::Encoding {
                detail: "no image data provided".into(),
            });
        }
        let request = self
            .http
            .post(&self.endpoint)
            .form(&[("base64", base64_image)]);
        self.send(request).await
    }

    /// Extract text by uploading the file itself as a multipart `image` part.
    pub async fn extract_file(
        &self,
        path: impl AsRef<Path>,
        mime_type: &str,
    ) -> Result<OcrExtraction, NoteError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| NoteError::Encoding {
            detail: format!("cannot read '{}': {e}", path.display()),
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime_type)
            .map_err(|e| NoteError::Encoding {
                detail: format!("invalid MIME type '{mime_type}': {e}"),
            })?;
        let form = reqwest::multipart::Form::new().part("image", part);
        let request = self.http.post(&self.endpoint).multipart(form);
        self.send(request).await
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<OcrExtraction, NoteError> {
        let response = request
            .header("X-RapidAPI-Key", &self.api_key)
            .header("X-RapidAPI-Host", &self.host)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "OCR endpoint rejected the request");
            return Err(map_status_error(Service::Ocr, status, &body));
        }

        let body: Value = response.json().await.map_err(|e| NoteError::Service {
            service: Service::Ocr,
            detail: format!("invalid response body: {e}"),
        })?;

        // An `error` field in a 2xx body still means failure.
        if let Some(err) = body.get("error").filter(|e| !e.is_null()) {
            let detail = err.as_str().map(str::to_string).unwrap_or_else(|| err.to_string());
            return Err(NoteError::Service {
                service: Service::Ocr,
                detail,
            });
        }

        let mut fields = match body {
            Value::Object(map) => map,
            other => {
                return Err(NoteError::Service {
                    service: Service::Ocr,
                    detail: format!("unexpected response shape: {other}"),
                })
            }
        };
        let text = fields
            .remove("text")
            .and_then(|t| t.as_str().map(str::to_string))
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(NoteError::NoTextFound);
        }

        debug!("OCR extracted {} chars", text.len());
        Ok(OcrExtraction {
            text,
            metadata: fields,
        })
    }

    fn map_send_error(&self, e: reqwest::Error) -> NoteError {
        if e.is_timeout() {
            NoteError::Timeout {
                service: Service::Ocr,
                secs: self.timeout_secs,
            }
        } else {
            NoteError::Transport {
                service: Service::Ocr,
                detail: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnhanceConfig;

    fn test_client() -> OcrClient {
        let config = EnhanceConfig::builder()
            .ocr_endpoint("https://ocr-extract-text.p.rapidapi.com/ocr")
            .build()
            .unwrap();
        OcrClient::new(&config, &Credentials::new("k", "k")).unwrap()
    }

    #[test]
    fn host_is_derived_from_endpoint() {
        let client = test_client();
        assert_eq!(client.host, "ocr-extract-text.p.rapidapi.com");
    }

    #[tokio::test]
    async fn blank_base64_is_rejected_locally() {
        let client = test_client();
        let err = client.extract_base64("   ").await.unwrap_err();
        assert!(matches!(err, NoteError::Encoding { .. }));
    }

    #[tokio::test]
    async fn missing_file_is_rejected_before_any_request() {
        let client = test_client();
        let err = client
            .extract_file("/nope/gone.png", "image/png")
            .await
            .unwrap_err();
        assert!(matches!(err, NoteError::Encoding { .. }));
    }
}
