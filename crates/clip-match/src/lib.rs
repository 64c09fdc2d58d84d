//! Note-to-highlight matching.
//!
//! Every note is attached to the highlight on the same page (or, failing
//! that, the same location) whose timestamp is closest to the note's. Each
//! note is matched independently against the full highlight set, so several
//! notes may land on one highlight and a highlight may get none.

use chrono::NaiveDateTime;

use clip_core::entry::{AttachedNote, Entry, EntryKind, MatchedHighlight};

/// Result of a matching pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchOutcome {
    /// One per highlight entry, sorted by `(page, timestamp)`.
    pub highlights: Vec<MatchedHighlight>,
    /// Notes with no highlight on their page or location.
    pub unmatched_notes: Vec<Entry>,
}

impl MatchOutcome {
    pub fn notes_attached(&self) -> usize {
        self.highlights.iter().map(|h| h.notes.len()).sum()
    }
}

/// Attach notes to highlights and return the highlights.
pub fn match_notes(entries: Vec<Entry>) -> Vec<MatchedHighlight> {
    match_entries(entries).highlights
}

/// Attach notes to highlights, keeping track of notes that found no home.
pub fn match_entries(entries: Vec<Entry>) -> MatchOutcome {
    let (mut highlights, mut notes): (Vec<Entry>, Vec<Entry>) =
        entries.into_iter().partition(Entry::is_highlight);

    // Stable sorts: equal keys keep input order
    highlights.sort_by_key(Entry::sort_key);
    notes.sort_by_key(Entry::sort_key);

    let mut matched: Vec<MatchedHighlight> =
        highlights.into_iter().map(MatchedHighlight::from).collect();
    let mut unmatched_notes = Vec::new();

    for note in notes {
        debug_assert_eq!(note.kind, EntryKind::Note);

        let mut candidates: Vec<usize> = matched
            .iter()
            .enumerate()
            .filter(|(_, hl)| hl.page == note.page)
            .map(|(i, _)| i)
            .collect();

        if candidates.is_empty() {
            if let Some(ref loc) = note.location {
                candidates = matched
                    .iter()
                    .enumerate()
                    .filter(|(_, hl)| hl.location.as_ref() == Some(loc))
                    .map(|(i, _)| i)
                    .collect();
            }
        }

        match closest_in_time(&matched, &candidates, note.timestamp) {
            Some(best) => {
                log::debug!(
                    "Note {:?} -> highlight {:?} (page {:?})",
                    truncate(&note.text),
                    truncate(&matched[best].text),
                    matched[best].page
                );
                matched[best].attach(AttachedNote {
                    text: note.text,
                    timestamp: note.timestamp,
                });
            }
            None => {
                log::debug!(
                    "No highlight for note {:?} (page {:?}, location {:?})",
                    truncate(&note.text),
                    note.page,
                    note.location
                );
                unmatched_notes.push(note);
            }
        }
    }

    let outcome = MatchOutcome {
        highlights: matched,
        unmatched_notes,
    };
    log::info!(
        "Matched {} notes to {} highlights ({} unmatched)",
        outcome.notes_attached(),
        outcome.highlights.len(),
        outcome.unmatched_notes.len()
    );
    outcome
}

/// Index of the candidate whose timestamp is nearest `at`. The first
/// candidate wins ties. Missing timestamps count as the earliest instant.
fn closest_in_time(
    highlights: &[MatchedHighlight],
    candidates: &[usize],
    at: Option<NaiveDateTime>,
) -> Option<usize> {
    let at = at.unwrap_or(NaiveDateTime::MIN);
    let mut best: Option<(usize, i64)> = None;

    for &idx in candidates {
        let ts = highlights[idx].timestamp.unwrap_or(NaiveDateTime::MIN);
        let diff = ts.signed_duration_since(at).num_milliseconds().abs();
        match best {
            Some((_, best_diff)) if diff >= best_diff => {}
            _ => best = Some((idx, diff)),
        }
    }

    best.map(|(idx, _)| idx)
}

fn truncate(text: &str) -> String {
    text.chars().take(40).collect()
}
