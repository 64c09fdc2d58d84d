//! Records parsed from a clippings export and the highlight/note pairs built from them.

use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

/// Whether a clipping is a highlighted passage or a free-form note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Highlight,
    Note,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Highlight => write!(f, "highlight"),
            EntryKind::Note => write!(f, "note"),
        }
    }
}

/// A single highlight or note from the clippings file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    /// First line of the block (book title and author). Only used for filtering.
    pub title: String,
    pub kind: EntryKind,
    /// Whitespace-collapsed clipping text.
    pub text: String,
    /// 1-based page number, when the header carries one.
    pub page: Option<u32>,
    /// Device location token such as `"40-41"`. Fallback key when `page` is absent.
    pub location: Option<String>,
    pub timestamp: Option<NaiveDateTime>,
}

impl Entry {
    pub fn new(kind: EntryKind, text: impl Into<String>) -> Self {
        Self {
            title: String::new(),
            kind,
            text: text.into(),
            page: None,
            location: None,
            timestamp: None,
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: NaiveDateTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn is_highlight(&self) -> bool {
        self.kind == EntryKind::Highlight
    }

    /// Ordering key used by the matcher: missing pages sort last,
    /// missing timestamps sort as the earliest instant.
    pub fn sort_key(&self) -> (u32, NaiveDateTime) {
        sort_key(self.page, self.timestamp)
    }
}

/// `(page, timestamp)` ordering shared by entries and matched highlights.
pub fn sort_key(page: Option<u32>, timestamp: Option<NaiveDateTime>) -> (u32, NaiveDateTime) {
    (
        page.unwrap_or(u32::MAX),
        timestamp.unwrap_or(NaiveDateTime::MIN),
    )
}

/// A note attached to a highlight by the matcher.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttachedNote {
    pub text: String,
    pub timestamp: Option<NaiveDateTime>,
}

/// A highlight together with the notes matched to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedHighlight {
    pub text: String,
    pub page: Option<u32>,
    pub location: Option<String>,
    pub timestamp: Option<NaiveDateTime>,
    /// Notes in the order they were matched.
    pub notes: Vec<AttachedNote>,
}

impl MatchedHighlight {
    pub fn attach(&mut self, note: AttachedNote) {
        self.notes.push(note);
    }
}

impl From<Entry> for MatchedHighlight {
    fn from(entry: Entry) -> Self {
        Self {
            text: entry.text,
            page: entry.page,
            location: entry.location,
            timestamp: entry.timestamp,
            notes: Vec::new(),
        }
    }
}
