//! Whitespace normalisation and search folding.

/// Typographic characters folded to ASCII before text comparison.
const FOLDS: &[(char, &str)] = &[
    ('\u{201c}', "\""),  // left double quote
    ('\u{201d}', "\""),  // right double quote
    ('\u{201e}', "\""),  // double low-9 quote
    ('\u{2018}', "'"),   // left single quote
    ('\u{2019}', "'"),   // right single quote
    ('\u{201a}', "'"),   // single low-9 quote
    ('\u{2010}', "-"),   // hyphen
    ('\u{2011}', "-"),   // non-breaking hyphen
    ('\u{2013}', "-"),   // en-dash
    ('\u{2014}', "--"),  // em-dash
    ('\u{2026}', "..."), // ellipsis
    ('\u{fb00}', "ff"),
    ('\u{fb01}', "fi"),
    ('\u{fb02}', "fl"),
    ('\u{fb03}', "ffi"),
    ('\u{fb04}', "ffl"),
];

/// Collapse every whitespace run (including non-breaking spaces) to a single
/// ASCII space and trim both ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split(|c: char| c.is_whitespace() || c == '\u{feff}')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text prepared for case- and punctuation-insensitive search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FoldedText {
    pub chars: Vec<char>,
    /// For every folded char, the index of the source char it came from.
    pub origins: Vec<usize>,
}

impl FoldedText {
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}

/// Fold `text` for searching: whitespace collapsed and trimmed, lowercased,
/// typographic punctuation and ligatures replaced by ASCII.
pub fn fold_for_search(text: &str) -> FoldedText {
    let mut folded = FoldedText::default();
    let mut pending_space: Option<usize> = None;

    for (idx, ch) in text.chars().enumerate() {
        if ch.is_whitespace() || ch == '\u{feff}' {
            if !folded.is_empty() && pending_space.is_none() {
                pending_space = Some(idx);
            }
            continue;
        }
        if let Some(space_idx) = pending_space.take() {
            folded.chars.push(' ');
            folded.origins.push(space_idx);
        }
        match FOLDS.iter().find(|(from, _)| *from == ch) {
            Some((_, to)) => {
                for c in to.chars() {
                    folded.chars.push(c);
                    folded.origins.push(idx);
                }
            }
            None => {
                for c in ch.to_lowercase() {
                    folded.chars.push(c);
                    folded.origins.push(idx);
                }
            }
        }
    }

    folded
}

/// Positions of every non-overlapping occurrence of `needle` in `haystack`.
pub fn find_all(haystack: &[char], needle: &[char]) -> Vec<usize> {
    let mut hits = Vec::new();
    if needle.is_empty() || needle.len() > haystack.len() {
        return hits;
    }
    let mut start = 0;
    while start + needle.len() <= haystack.len() {
        if haystack[start..start + needle.len()] == *needle {
            hits.push(start);
            start += needle.len();
        } else {
            start += 1;
        }
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(
            collapse_whitespace("  The\u{00a0}quick \t\n fox  "),
            "The quick fox"
        );
        assert_eq!(collapse_whitespace(""), "");
        assert_eq!(collapse_whitespace(" \n "), "");
    }

    #[test]
    fn test_collapse_whitespace_is_idempotent() {
        let samples = [
            "a  b",
            "\u{00a0}lead and trail\u{00a0}",
            "line one\r\nline two\n\nline three",
            "\u{feff}bom first",
            "already clean",
        ];
        for s in samples {
            let once = collapse_whitespace(s);
            assert_eq!(collapse_whitespace(&once), once, "input: {:?}", s);
        }
    }

    #[test]
    fn test_fold_for_search_lowercases_and_collapses() {
        let folded = fold_for_search("  The   Quick\nFox ");
        let s: String = folded.chars.iter().collect();
        assert_eq!(s, "the quick fox");
        // 't' comes from source index 2, the space after "The" from index 5
        assert_eq!(folded.origins[0], 2);
        assert_eq!(folded.origins[3], 5);
    }

    #[test]
    fn test_fold_for_search_typography() {
        let folded = fold_for_search("\u{201c}Don\u{2019}t\u{201d} \u{fb01}nd");
        let s: String = folded.chars.iter().collect();
        assert_eq!(s, "\"don't\" find");
        // Both chars of the "fi" ligature map back to the same source char
        assert_eq!(folded.origins[8], folded.origins[9]);
    }

    #[test]
    fn test_find_all_non_overlapping() {
        let hay: Vec<char> = "aaaa".chars().collect();
        let needle: Vec<char> = "aa".chars().collect();
        assert_eq!(find_all(&hay, &needle), vec![0, 2]);

        let hay: Vec<char> = "the fox and the dog".chars().collect();
        let needle: Vec<char> = "the".chars().collect();
        assert_eq!(find_all(&hay, &needle), vec![0, 12]);

        assert!(find_all(&hay, &[]).is_empty());
    }
}
