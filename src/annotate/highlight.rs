//! User-driven text highlighting over a fixed text.
//!
//! Highlights are character-offset ranges with a color, kept in a
//! [`HighlightSet`] sorted by start offset. Insertion resolves overlap
//! explicitly instead of appending blindly: overlapping or touching ranges
//! of the same color merge into one span, and a range that overlaps an
//! existing mark of a different color is rejected, so [`HighlightSet::segments`]
//! can always assume disjoint, ordered intervals.
//!
//! Offsets count `char`s, matching what a frontend measures over rendered
//! text. Ranges past the end of the text are clamped at render time.

use serde::{Deserialize, Serialize};

/// Color palette offered by the highlight menu.
pub const HIGHLIGHT_PALETTE: [&str; 6] = [
    "#fef08a", // yellow
    "#a7f3d0", // green
    "#bae6fd", // blue
    "#fca5a5", // red
    "#fcd34d", // orange
    "#ddd6fe", // purple
];

/// A single highlight: `[start, end)` char offsets and a CSS color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    pub start: usize,
    pub end: usize,
    pub color: String,
}

impl Highlight {
    pub fn new(start: usize, end: usize, color: impl Into<String>) -> Self {
        Self {
            start,
            end,
            color: color.into(),
        }
    }

    fn overlaps(&self, other: &Highlight) -> bool {
        self.start < other.end && other.start < self.end
    }

    fn touches(&self, other: &Highlight) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// What [`HighlightSet::insert`] did with a candidate highlight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Added as a new disjoint mark.
    Inserted,
    /// Combined with one or more same-color marks into a single span.
    Merged,
    /// Dropped: empty range, or overlap with a differently-colored mark.
    Rejected,
}

/// One piece of a highlighted text, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextSegment {
    Plain(String),
    Marked { text: String, color: String },
}

impl TextSegment {
    pub fn text(&self) -> &str {
        match self {
            TextSegment::Plain(t) => t,
            TextSegment::Marked { text, .. } => text,
        }
    }
}

/// An ordered, non-overlapping set of highlights.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightSet {
    items: Vec<Highlight>,
}

impl HighlightSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Highlights sorted by start offset.
    pub fn items(&self) -> &[Highlight] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Insert a highlight, merging same-color neighbours and rejecting
    /// overlaps with differently-colored marks.
    pub fn insert(&mut self, candidate: Highlight) -> InsertOutcome {
        if candidate.start >= candidate.end {
            return InsertOutcome::Rejected;
        }

        // Any overlap with a different color keeps the existing mark.
        if self
            .items
            .iter()
            .any(|h| h.overlaps(&candidate) && h.color != candidate.color)
        {
            return InsertOutcome::Rejected;
        }

        // Absorb every same-color mark that overlaps or touches the
        // candidate into one span.
        let mut merged = candidate;
        let mut absorbed = false;
        self.items.retain(|h| {
            if h.color == merged.color && h.touches(&merged) {
                merged.start = merged.start.min(h.start);
                merged.end = merged.end.max(h.end);
                absorbed = true;
                false
            } else {
                true
            }
        });

        let at = self
            .items
            .partition_point(|h| h.start < merged.start);
        self.items.insert(at, merged);

        if absorbed {
            InsertOutcome::Merged
        } else {
            InsertOutcome::Inserted
        }
    }

    /// Split `text` into alternating plain and marked segments.
    ///
    /// With no highlights, the result is the input as one plain segment.
    /// Segments reassemble to exactly the input text; ranges beyond the end
    /// of the text are clamped.
    pub fn segments(&self, text: &str) -> Vec<TextSegment> {
        if self.items.is_empty() {
            return if text.is_empty() {
                Vec::new()
            } else {
                vec![TextSegment::Plain(text.to_string())]
            };
        }

        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        let slice = |from: usize, to: usize| chars[from..to].iter().collect::<String>();

        let mut segments = Vec::new();
        let mut cursor = 0;
        for h in &self.items {
            let start = h.start.min(total);
            let end = h.end.min(total);
            if start >= end {
                continue;
            }
            if cursor < start {
                segments.push(TextSegment::Plain(slice(cursor, start)));
            }
            segments.push(TextSegment::Marked {
                text: slice(start, end),
                color: h.color.clone(),
            });
            cursor = end;
        }
        if cursor < total {
            segments.push(TextSegment::Plain(slice(cursor, total)));
        }
        segments
    }
}
