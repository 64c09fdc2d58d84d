//! Text search over a page layout.
//!
//! The page's fragments are concatenated in document order, then searched
//! case-insensitively with whitespace and typographic punctuation folded.
//! Fragments are separated by a single space unless the next one continues
//! the previous one on the same line (pdftohtml splits words at font
//! changes). A match yields one rectangle per fragment it touches, narrowed
//! to the matched characters by assuming uniform glyph width within the
//! fragment.

use clip_core::target::Rect;
use clip_utils::text::{find_all, fold_for_search};

use crate::pdftohtml::{PageLayout, TextFragment};

/// Maximum gap, in layout units, between the right edge of one fragment and
/// the left edge of the next for the two to be joined without a space.
const ADJACENT_GAP: f64 = 1.0;

/// Where a folded haystack char came from.
#[derive(Debug, Clone, Copy)]
struct CharOrigin {
    fragment: usize,
    /// Char index within the fragment's original text.
    index: usize,
}

/// A page layout with its folded text, built once and searched many times.
#[derive(Debug, Clone)]
pub struct PageText {
    layout: PageLayout,
    haystack: Vec<char>,
    /// `None` for separators inserted between fragments.
    origins: Vec<Option<CharOrigin>>,
}

impl PageText {
    pub fn new(layout: PageLayout) -> Self {
        let mut haystack: Vec<char> = Vec::new();
        let mut origins: Vec<Option<CharOrigin>> = Vec::new();
        let mut previous: Option<&TextFragment> = None;

        for (fragment_idx, fragment) in layout.fragments.iter().enumerate() {
            let folded = fold_for_search(&fragment.text);
            if folded.is_empty() {
                continue;
            }
            if let Some(prev) = previous {
                if !continues(prev, fragment) {
                    haystack.push(' ');
                    origins.push(None);
                }
            }
            for (ch, index) in folded.chars.iter().zip(folded.origins.iter()) {
                haystack.push(*ch);
                origins.push(Some(CharOrigin {
                    fragment: fragment_idx,
                    index: *index,
                }));
            }
            previous = Some(fragment);
        }

        Self {
            layout,
            haystack,
            origins,
        }
    }

    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    /// Every region covered by an occurrence of `needle`, in reading order.
    /// Occurrences do not overlap.
    pub fn search(&self, needle: &str) -> Vec<Rect> {
        let needle = fold_for_search(needle);
        if needle.is_empty() {
            return Vec::new();
        }

        let mut rects = Vec::new();
        for start in find_all(&self.haystack, &needle.chars) {
            let span = &self.origins[start..start + needle.len()];
            rects.extend(span_rects(&self.layout, span));
        }
        rects
    }
}

/// Whether `next` carries on the text of `prev` with no word break between them.
fn continues(prev: &TextFragment, next: &TextFragment) -> bool {
    let same_line = (next.top - prev.top).abs() < prev.height.max(next.height) / 2.0;
    let touching = (next.left - (prev.left + prev.width)).abs() <= ADJACENT_GAP;
    let spaced = prev.text.ends_with(char::is_whitespace) || next.text.starts_with(char::is_whitespace);
    same_line && touching && !spaced
}

/// One rectangle per fragment touched by `span`, in the order first touched.
fn span_rects(page: &PageLayout, span: &[Option<CharOrigin>]) -> Vec<Rect> {
    // (fragment, first char, last char)
    let mut ranges: Vec<(usize, usize, usize)> = Vec::new();
    for origin in span.iter().flatten() {
        match ranges.iter_mut().find(|(f, _, _)| *f == origin.fragment) {
            Some(range) => {
                range.1 = range.1.min(origin.index);
                range.2 = range.2.max(origin.index);
            }
            None => ranges.push((origin.fragment, origin.index, origin.index)),
        }
    }

    ranges
        .into_iter()
        .map(|(fragment_idx, first, last)| {
            let fragment = &page.fragments[fragment_idx];
            let count = fragment.text.chars().count().max(1) as f64;
            let char_width = fragment.width / count;
            Rect::new(
                fragment.left + char_width * first as f64,
                fragment.top,
                fragment.left + char_width * (last + 1) as f64,
                fragment.top + fragment.height,
            )
        })
        .collect()
}
