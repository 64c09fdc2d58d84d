//! Outcome of an annotation run.

use crate::entry::{Entry, EntryKind, MatchedHighlight};

/// Counts of placed annotations plus the highlights that could not be found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationReport {
    pub highlights_added: usize,
    pub notes_added: usize,
    /// Highlights whose text was not found anywhere in their search scope.
    pub unplaced: Vec<MatchedHighlight>,
}

impl AnnotationReport {
    /// Highlights, and the notes riding on them, that produced no annotation.
    pub fn unprocessed(&self) -> Vec<(EntryKind, &str)> {
        let mut out = Vec::new();
        for hl in &self.unplaced {
            out.push((EntryKind::Highlight, hl.text.as_str()));
            for note in &hl.notes {
                out.push((EntryKind::Note, note.text.as_str()));
            }
        }
        out
    }
}

/// One line of the "could not process" listing, truncated to `max_chars`.
pub fn describe_unprocessed(kind: EntryKind, text: &str, max_chars: usize) -> String {
    let shown: String = text.chars().take(max_chars).collect();
    format!("- [{}] {}...", kind, shown)
}

/// Same as [`describe_unprocessed`] for an entry that never reached the annotator.
pub fn describe_entry(entry: &Entry, max_chars: usize) -> String {
    describe_unprocessed(entry.kind, &entry.text, max_chars)
}
