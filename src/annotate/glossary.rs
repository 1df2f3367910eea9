//! Glossary term matching for tooltip rendering.
//!
//! Terms are compiled once into a single whole-word, case-insensitive
//! alternation, longest term first so an overlapping shorter term never
//! shadows a longer one ("Learning" can never steal the middle of
//! "Reinforcement Learning"). Matching is recomputed from the full text on
//! every call; nothing is cached between renders and nothing persists.

use once_cell::sync::Lazy;
use regex::Regex;

/// A term and its tooltip definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlossaryTerm {
    pub term: String,
    pub definition: String,
}

/// One piece of an annotated text, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlossarySegment {
    /// Text with no glossary match.
    Plain(String),
    /// A matched term occurrence.
    Term {
        /// The text as it appears in the input (original casing).
        text: String,
        /// The canonical term, as registered in the glossary.
        term: String,
        /// The definition to show.
        definition: String,
    },
}

impl GlossarySegment {
    /// The underlying text of this segment.
    pub fn text(&self) -> &str {
        match self {
            GlossarySegment::Plain(t) => t,
            GlossarySegment::Term { text, .. } => text,
        }
    }
}

static BUILTIN: Lazy<Glossary> = Lazy::new(|| {
    Glossary::new([
        GlossaryTerm {
            term: "Reinforcement Learning".into(),
            definition: "A type of machine learning where an agent learns to make decisions \
                         by receiving rewards or penalties."
                .into(),
        },
        GlossaryTerm {
            term: "Neural Network".into(),
            definition: "A computational model inspired by the human brain, used in machine \
                         learning to recognize patterns."
                .into(),
        },
        GlossaryTerm {
            term: "Eligibility Traces".into(),
            definition: "A mechanism in reinforcement learning that helps an agent assign \
                         credit to actions and states that happened in the recent past, making \
                         learning more efficient."
                .into(),
        },
    ])
});

/// An immutable term→definition set with compiled matching.
#[derive(Debug, Clone)]
pub struct Glossary {
    terms: Vec<GlossaryTerm>,
    // None when the glossary is empty; an empty alternation would match
    // everywhere.
    matcher: Option<Regex>,
}

impl Glossary {
    /// Build a glossary from arbitrary terms.
    pub fn new(terms: impl IntoIterator<Item = GlossaryTerm>) -> Self {
        let mut terms: Vec<GlossaryTerm> = terms
            .into_iter()
            .filter(|t| !t.term.trim().is_empty())
            .collect();
        // Longest first, so the alternation prefers the longest match at any
        // given position.
        terms.sort_by(|a, b| b.term.len().cmp(&a.term.len()));

        let matcher = if terms.is_empty() {
            None
        } else {
            let alternation = terms
                .iter()
                .map(|t| regex::escape(&t.term))
                .collect::<Vec<_>>()
                .join("|");
            let pattern = format!(r"(?i)\b(?:{alternation})\b");
            Some(Regex::new(&pattern).expect("escaped alternation compiles"))
        };

        Self { terms, matcher }
    }

    /// The built-in study glossary.
    pub fn builtin() -> &'static Glossary {
        &BUILTIN
    }

    /// Registered terms, longest first.
    pub fn terms(&self) -> &[GlossaryTerm] {
        &self.terms
    }

    /// Case-insensitive definition lookup.
    pub fn definition(&self, term: &str) -> Option<&str> {
        self.terms
            .iter()
            .find(|t| t.term.eq_ignore_ascii_case(term))
            .map(|t| t.definition.as_str())
    }

    /// Split `text` into ordered segments, wrapping every whole-word,
    /// case-insensitive term occurrence.
    ///
    /// Segments reassemble to exactly the input text.
    pub fn annotate(&self, text: &str) -> Vec<GlossarySegment> {
        let Some(matcher) = &self.matcher else {
            return if text.is_empty() {
                Vec::new()
            } else {
                vec![GlossarySegment::Plain(text.to_string())]
            };
        };

        let mut segments = Vec::new();
        let mut last = 0;
        for m in matcher.find_iter(text) {
            if m.start() > last {
                segments.push(GlossarySegment::Plain(text[last..m.start()].to_string()));
            }
            let matched = m.as_str();
            let canonical = self
                .terms
                .iter()
                .find(|t| t.term.eq_ignore_ascii_case(matched))
                .expect("matcher only matches registered terms");
            segments.push(GlossarySegment::Term {
                text: matched.to_string(),
                term: canonical.term.clone(),
                definition: canonical.definition.clone(),
            });
            last = m.end();
        }
        if last < text.len() {
            segments.push(GlossarySegment::Plain(text[last..].to_string()));
        }
        segments
    }
}
