//! Post-processing: deterministic cleanup of model output.
//!
//! The configured model interleaves its answer with delimited internal
//! reasoning. The prompt asks it not to; models disobey. [`strip_reasoning`]
//! is the hard guarantee and runs on every successful enhancement and Q&A
//! response, prompt or no prompt.
//!
//! [`tidy`] applies the small whitespace rules the summary renderer expects:
//! LF line endings and no runs of blank lines. Each rule is a pure
//! `&str → String` pass, independently testable.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_REASONING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<think>.*?</think>").expect("reasoning regex compiles"));

static RE_BLANK_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{4,}").expect("blank-line regex compiles"));

/// Remove every `<think>…</think>` segment, then trim.
///
/// Matching is case-insensitive and non-greedy, and `.` spans newlines, so
/// multiple multi-line segments each collapse independently:
/// `"A<think>hidden</think>B"` becomes exactly `"AB"`.
pub fn strip_reasoning(text: &str) -> String {
    RE_REASONING.replace_all(text, "").trim().to_string()
}

/// Normalise line endings and collapse runs of blank lines.
pub fn tidy(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    RE_BLANK_LINES.replace_all(&unified, "\n\n\n").trim_end().to_string()
}

/// The mandatory scrub applied to every successful model response.
pub fn scrub_model_output(raw: &str) -> String {
    tidy(&strip_reasoning(raw))
}
