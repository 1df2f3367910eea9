//! End-to-end pipeline tests against a mock HTTP server.
//!
//! Every scenario drives the real `NoteSession` with both remote endpoints
//! pointed at a local wiremock server. `expect(0)` mounts double as the
//! "no network call was attempted" assertions from the crate's contract:
//! wiremock verifies expectations when the server drops.

use notespark::pipeline::encode::encode_bytes;
use notespark::{
    Credentials, EnhanceConfig, NoteError, NoteSession, ProcessingStatus, PromptProfile,
};
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Test helpers ─────────────────────────────────────────────────────────────

const OCR_KEY: &str = "test-ocr-key";
const LLM_KEY: &str = "test-llm-key";

fn config_for(server: &MockServer) -> EnhanceConfig {
    EnhanceConfig::builder()
        .ocr_endpoint(format!("{}/ocr", server.uri()))
        .chat_endpoint(format!("{}/v1/chat/completions", server.uri()))
        .build()
        .expect("valid test config")
}

fn session_for(server: &MockServer) -> NoteSession {
    NoteSession::with_credentials(config_for(server), Credentials::new(OCR_KEY, LLM_KEY))
        .expect("session builds")
}

fn chat_body(content: &str) -> serde_json::Value {
    serde_json::json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    })
}

/// Write a small PNG-named fixture and return its path.
fn write_image(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).expect("fixture written");
    path
}

// ── Image pipeline ───────────────────────────────────────────────────────────

#[tokio::test]
async fn image_pipeline_extracts_enhances_and_records_history() {
    let server = MockServer::start().await;
    let image_bytes = b"not a real png, but bytes are bytes";
    // Base64 padding is percent-encoded in the form body; match on the
    // unpadded prefix.
    let payload = encode_bytes(image_bytes);
    let payload = payload.trim_end_matches('=').to_string();

    Mock::given(method("POST"))
        .and(path("/ocr"))
        .and(header("X-RapidAPI-Key", OCR_KEY))
        .and(body_string_contains(payload.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "text": "Newton's first law: objects persist in motion",
            "confidence": 0.93
        })))
        .expect(1)
        .mount(&server)
        .await;

    let bearer = format!("Bearer {LLM_KEY}");
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", bearer.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(
            "<think>inertia, lists, emoji…</think># 🧲 Inertia\n\n- Objects persist",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let image = write_image(&dir, "board.png", image_bytes);

    let mut session = session_for(&server);
    let item = session.process_image(&image).await.expect("pipeline succeeds");

    assert_eq!(session.status(), ProcessingStatus::Complete);
    assert_eq!(item.extracted_text, "Newton's first law: objects persist in motion");
    assert_eq!(item.summary, "# 🧲 Inertia\n\n- Objects persist");
    assert!(item.image.as_deref().unwrap().ends_with("board.png"));

    // History is prepended and the chat is seeded with the greeting.
    assert_eq!(session.history().len(), 1);
    assert_eq!(session.history()[0].id, item.id);
    assert_eq!(session.chat().len(), 1);
    assert_eq!(
        session.chat()[0].content,
        "I've summarized the content. Ask me anything about it!"
    );
}

#[tokio::test]
async fn rejected_upload_never_touches_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let image = write_image(&dir, "animation.gif", b"GIF89a...");

    let mut session = session_for(&server);
    let err = session.process_image(&image).await.unwrap_err();

    assert!(matches!(err, NoteError::InvalidImage { .. }));
    assert_eq!(session.status(), ProcessingStatus::Error);
    assert_eq!(
        session.error_message(),
        Some("Invalid file type. Please upload a JPEG, PNG, or WebP image.")
    );
}

#[tokio::test]
async fn oversized_upload_never_touches_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let image = write_image(&dir, "huge.jpg", &vec![0u8; 5 * 1024 * 1024 + 1]);

    let mut session = session_for(&server);
    let err = session.process_image(&image).await.unwrap_err();

    assert!(matches!(err, NoteError::InvalidImage { .. }));
    assert!(session
        .error_message()
        .unwrap()
        .contains("File too large"));
}

#[tokio::test]
async fn blank_ocr_text_stops_before_summarizing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ocr"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "text": "   " })),
        )
        .expect(1)
        .mount(&server)
        .await;
    // The chat endpoint must never be reached.
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let image = write_image(&dir, "empty.webp", b"webp-ish");

    let mut session = session_for(&server);
    let err = session.process_image(&image).await.unwrap_err();

    assert!(matches!(err, NoteError::NoTextFound));
    assert_eq!(session.status(), ProcessingStatus::Error);
    assert!(session
        .error_message()
        .unwrap()
        .contains("No text could be extracted"));
}

#[tokio::test]
async fn ocr_multipart_variant_uploads_the_file_itself() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ocr"))
        .and(header("X-RapidAPI-Key", OCR_KEY))
        .and(body_string_contains("upload.jpg"))
        .and(body_string_contains("jpeg bytes here"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "text": "from multipart" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let image = write_image(&dir, "upload.jpg", b"jpeg bytes here");

    let client = notespark::pipeline::ocr::OcrClient::new(
        &config_for(&server),
        &Credentials::new(OCR_KEY, LLM_KEY),
    )
    .unwrap();
    let extraction = client.extract_file(&image, "image/jpeg").await.unwrap();
    assert_eq!(extraction.text, "from multipart");
}

#[tokio::test]
async fn ocr_error_field_in_2xx_body_is_a_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ocr"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "error": "unsupported image"
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let image = write_image(&dir, "odd.png", b"png-ish");

    let mut session = session_for(&server);
    let err = session.process_image(&image).await.unwrap_err();

    match err {
        NoteError::Service { detail, .. } => assert!(detail.contains("unsupported image")),
        other => panic!("expected Service error, got {other:?}"),
    }
}

#[tokio::test]
async fn ocr_timeout_maps_to_timeout_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ocr"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(1500))
                .set_body_json(serde_json::json!({ "text": "late" })),
        )
        .mount(&server)
        .await;

    let config = EnhanceConfig::builder()
        .ocr_endpoint(format!("{}/ocr", server.uri()))
        .chat_endpoint(format!("{}/v1/chat/completions", server.uri()))
        .ocr_timeout_secs(1)
        .build()
        .unwrap();
    let mut session =
        NoteSession::with_credentials(config, Credentials::new(OCR_KEY, LLM_KEY)).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let image = write_image(&dir, "slow.jpg", b"jpeg-ish");

    let err = session.process_image(&image).await.unwrap_err();
    assert!(matches!(err, NoteError::Timeout { .. }));
    assert!(session.error_message().unwrap().contains("timed out"));
}

// ── Direct text entry ────────────────────────────────────────────────────────

#[tokio::test]
async fn direct_text_calls_enhancement_once_and_ocr_never() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ocr"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("Newton's first law"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("🚀 Enhanced notes")))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    let item = session
        .process_text("Newton's first law: an object in motion stays in motion")
        .await
        .expect("direct text path succeeds");

    assert_eq!(session.status(), ProcessingStatus::Complete);
    assert_eq!(item.image, None);
    assert_eq!(
        item.extracted_text,
        "Newton's first law: an object in motion stays in motion"
    );
    assert_eq!(item.summary, "🚀 Enhanced notes");
    assert_eq!(session.history().len(), 1);
}

#[tokio::test]
async fn back_to_back_runs_accumulate_history_newest_first() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("enhanced")))
        .expect(2)
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    session.process_text("first note").await.unwrap();
    // A new run supersedes the completed one without an explicit reset.
    session.process_text("second note").await.unwrap();

    assert_eq!(session.status(), ProcessingStatus::Complete);
    assert_eq!(session.history().len(), 2);
    assert_eq!(session.history()[0].extracted_text, "second note");
    assert_eq!(session.history()[1].extracted_text, "first note");
}

#[tokio::test]
async fn enhancement_strips_reasoning_segments() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(
            "A<think>step 1\nstep 2</think>B",
        )))
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    let item = session.process_text("anything").await.unwrap();
    assert_eq!(item.summary, "AB");
}

// ── Error taxonomy from the chat endpoint ────────────────────────────────────

#[tokio::test]
async fn chat_auth_failure_maps_to_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    let err = session.process_text("some notes").await.unwrap_err();

    assert!(matches!(err, NoteError::Auth { .. }));
    assert!(session
        .error_message()
        .unwrap()
        .contains("Authentication error"));
}

#[tokio::test]
async fn chat_rate_limit_maps_to_rate_limit_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    let err = session.process_text("some notes").await.unwrap_err();

    assert!(matches!(err, NoteError::RateLimit { .. }));
    assert!(session.error_message().unwrap().contains("Rate limit"));
}

#[tokio::test]
async fn chat_bad_request_echoes_remote_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": { "message": "`max_tokens` must be a positive integer" }
        })))
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    let err = session.process_text("some notes").await.unwrap_err();

    match err {
        NoteError::BadRequest { message, .. } => {
            assert_eq!(message, "`max_tokens` must be a positive integer")
        }
        other => panic!("expected BadRequest, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_chat_endpoint_maps_to_transport_error() {
    // Nothing listens on port 9 (discard); connection is refused without a
    // response.
    let config = EnhanceConfig::builder()
        .ocr_endpoint("http://127.0.0.1:9/ocr")
        .chat_endpoint("http://127.0.0.1:9/v1/chat/completions")
        .build()
        .unwrap();
    let mut session =
        NoteSession::with_credentials(config, Credentials::new(OCR_KEY, LLM_KEY)).unwrap();

    let err = session.process_text("some notes").await.unwrap_err();
    assert!(matches!(err, NoteError::Transport { .. }));
    assert!(session.error_message().unwrap().contains("No response"));
}

#[tokio::test]
async fn empty_choices_is_a_service_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })),
        )
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    let err = session.process_text("some notes").await.unwrap_err();
    assert!(matches!(err, NoteError::Service { .. }));
}

// ── Q&A ──────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn ask_sends_question_with_both_contexts_and_strips_reasoning() {
    let server = MockServer::start().await;
    // Enhancement call: default mock.
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("The summary 📌")))
        .mount(&server)
        .await;
    // Q&A call: recognised by the tutor message layout carrying all three
    // inputs.
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("Original text: photosynthesis uses light"))
        .and(body_string_contains("Summary: The summary 📌"))
        .and(body_string_contains("Student question: What about the dark?"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(
            "<think>scan the notes</think>The dark reactions still run.",
        )))
        .expect(1)
        .with_priority(1)
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    session
        .process_text("photosynthesis uses light")
        .await
        .unwrap();

    let answer = session.ask("What about the dark?").await.unwrap();
    assert_eq!(answer, "The dark reactions still run.");

    // greeting, user turn, assistant turn
    assert_eq!(session.chat().len(), 3);
    assert_eq!(session.chat()[1].content, "What about the dark?");
    assert_eq!(session.chat()[2].content, "The dark reactions still run.");
}

#[tokio::test]
async fn failed_answer_appends_fallback_turn_and_propagates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("Student question"))
        .respond_with(ResponseTemplate::new(500))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("Summary")))
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    session.process_text("mitosis phases").await.unwrap();

    let err = session.ask("how many phases?").await.unwrap_err();
    assert!(matches!(err, NoteError::Service { .. }));

    let last = session.chat().last().unwrap();
    assert_eq!(
        last.content,
        "Sorry, I had trouble answering that question. Please try again."
    );
    // The failed answer leaves the completed result untouched.
    assert_eq!(session.status(), ProcessingStatus::Complete);
}

// ── Profiles on the wire ─────────────────────────────────────────────────────

#[tokio::test]
async fn summary_profile_settings_reach_the_request_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("\"temperature\":0.3"))
        .and(body_string_contains("\"max_tokens\":1024"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("ok")))
        .expect(1)
        .mount(&server)
        .await;

    let config = EnhanceConfig::builder()
        .profile(PromptProfile::Summary)
        .ocr_endpoint(format!("{}/ocr", server.uri()))
        .chat_endpoint(format!("{}/v1/chat/completions", server.uri()))
        .build()
        .unwrap();
    let mut session =
        NoteSession::with_credentials(config, Credentials::new(OCR_KEY, LLM_KEY)).unwrap();

    session.process_text("short please").await.unwrap();
}
