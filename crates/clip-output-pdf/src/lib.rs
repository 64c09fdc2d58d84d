//! PDF annotation: find each highlight's text on its page and overlay
//! highlight and note annotations.
//!
//! Text geometry comes from poppler's `pdftohtml -xml`, annotations are
//! written with lopdf.

pub mod annotate;
pub mod document;
pub mod pdftohtml;
pub mod search;
pub mod writer;

use std::path::Path;

use clip_core::entry::MatchedHighlight;
use clip_core::error::{AnnotateError, Result};
use clip_core::options::AnnotateOptions;
use clip_core::report::AnnotationReport;
use clip_core::target::ProgressReporter;

pub use annotate::Annotator;
pub use document::PdfDocument;

/// Annotate `input` with `highlights` and write the result to `output`.
///
/// The output is written once, after every highlight has been processed.
pub fn annotate_pdf(
    input: &Path,
    output: &Path,
    highlights: &[MatchedHighlight],
    options: &AnnotateOptions,
    progress: Option<ProgressReporter>,
) -> Result<AnnotationReport> {
    if !input.is_file() {
        return Err(AnnotateError::MissingInput(input.to_path_buf()));
    }
    if same_file(input, output) {
        return Err(AnnotateError::OutputOverwritesInput(output.to_path_buf()));
    }

    let mut document = PdfDocument::open(input, options)?;

    let mut annotator = Annotator::new(options);
    if let Some(reporter) = progress {
        annotator = annotator.progress_reporter(reporter);
    }
    let report = annotator.run(&mut document, highlights)?;

    document.save(output)?;
    Ok(report)
}

/// Whether `output` names the same file as the existing `input`.
fn same_file(input: &Path, output: &Path) -> bool {
    if input == output {
        return true;
    }
    let Ok(input) = input.canonicalize() else {
        return false;
    };
    let output = match output.canonicalize() {
        Ok(p) => p,
        Err(_) => {
            // Output does not exist yet: resolve its directory instead
            let parent = match output.parent() {
                Some(p) if !p.as_os_str().is_empty() => p,
                _ => Path::new("."),
            };
            match (parent.canonicalize(), output.file_name()) {
                (Ok(dir), Some(name)) => dir.join(name),
                _ => return false,
            }
        }
    };
    input == output
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdftohtml::{PageLayout, TextFragment};
    use crate::testing::sample_document;
    use clip_core::options::NoteTextSource;
    use clip_input_kindle::parse_clippings;
    use clip_match::match_entries;
    use lopdf::{Document, Object};

    fn page_with(number: u32, lines: &[&str]) -> PageLayout {
        PageLayout {
            number,
            width: 612.0,
            height: 792.0,
            fragments: lines
                .iter()
                .enumerate()
                .map(|(i, text)| TextFragment {
                    top: 100.0 + 20.0 * i as f64,
                    left: 72.0,
                    width: 8.0 * text.chars().count() as f64,
                    height: 12.0,
                    text: text.to_string(),
                })
                .collect(),
        }
    }

    /// Subtypes of every annotation in a saved file.
    fn saved_subtypes(path: &Path) -> Vec<String> {
        let doc = Document::load(path).unwrap();
        let mut out = Vec::new();
        for page_id in doc.get_pages().values() {
            let page = doc.get_dictionary(*page_id).unwrap();
            let Ok(annots) = page.get(b"Annots") else {
                continue;
            };
            for annot in annots.as_array().unwrap() {
                let dict = doc.get_dictionary(annot.as_reference().unwrap()).unwrap();
                let subtype = dict.get(b"Subtype").unwrap().as_name().unwrap();
                out.push(String::from_utf8_lossy(subtype).to_string());
            }
        }
        out
    }

    fn count(subtypes: &[String], name: &str) -> usize {
        subtypes.iter().filter(|s| s.as_str() == name).count()
    }

    fn run_scenario(clippings: &str, layouts: Vec<PageLayout>) -> (AnnotationReport, Vec<String>, usize) {
        let options = AnnotateOptions::default();
        let outcome = match_entries(parse_clippings(clippings, NoteTextSource::AllLines));

        let mut pdf = PdfDocument::from_parts(sample_document(5), layouts, &options);
        let report = Annotator::new(&options).run(&mut pdf, &outcome.highlights).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("book_annotated.pdf");
        pdf.save(&out).unwrap();
        (report, saved_subtypes(&out), outcome.unmatched_notes.len())
    }

    #[test]
    fn test_single_highlight_end_to_end() {
        let clippings = "\
Book (Author)
- Your Highlight on page 3 | location 40-41 | Added on Monday, January 1, 2024 10:00:00 AM

The quick fox
==========
";
        let (report, subtypes, unmatched) = run_scenario(
            clippings,
            vec![page_with(3, &["Chapter One", "The quick fox jumped"])],
        );

        assert_eq!(report.highlights_added, 1);
        assert_eq!(report.notes_added, 0);
        assert!(report.unplaced.is_empty());
        assert_eq!(unmatched, 0);
        assert_eq!(count(&subtypes, "Highlight"), 1);
        assert_eq!(count(&subtypes, "Text"), 0);
    }

    #[test]
    fn test_note_without_highlight_end_to_end() {
        let clippings = "\
Book (Author)
- Your Note on page 3 | location 40 | Added on Monday, January 1, 2024 10:00:00 AM

A lonely thought
==========
";
        let (report, subtypes, unmatched) =
            run_scenario(clippings, vec![page_with(3, &["Nothing relevant here"])]);

        assert_eq!(report.highlights_added, 0);
        assert_eq!(report.notes_added, 0);
        assert!(subtypes.is_empty());
        assert_eq!(unmatched, 1);
    }

    #[test]
    fn test_two_notes_share_one_highlight_end_to_end() {
        let clippings = "\
Book (Author)
- Your Highlight on page 2 | Added on Monday, January 1, 2024 10:00:00 AM

It was the best of times
==========
Book (Author)
- Your Note on page 2 | Added on Monday, January 1, 2024 10:00:05 AM

Soon after
==========
Book (Author)
- Your Note on page 2 | Added on Monday, January 1, 2024 10:08:20 AM

Much later
==========
";
        let outcome = match_entries(parse_clippings(clippings, NoteTextSource::AllLines));
        assert_eq!(outcome.highlights.len(), 1);
        let notes: Vec<&str> = outcome.highlights[0]
            .notes
            .iter()
            .map(|n| n.text.as_str())
            .collect();
        assert_eq!(notes, vec!["Soon after", "Much later"]);

        let (report, subtypes, _) = run_scenario(
            clippings,
            vec![page_with(2, &["It was the best of times, it was"])],
        );
        assert_eq!(report.highlights_added, 1);
        assert_eq!(report.notes_added, 2);
        assert_eq!(count(&subtypes, "Highlight"), 1);
        assert_eq!(count(&subtypes, "Text"), 2);
    }

    #[test]
    fn test_unfound_highlight_is_reported_with_its_notes() {
        let clippings = "\
Book (Author)
- Your Highlight on page 1 | Added on Monday, January 1, 2024 10:00:00 AM

Words that are not in the book
==========
Book (Author)
- Your Note on page 1 | Added on Monday, January 1, 2024 10:00:30 AM

Still mine
==========
";
        let (report, subtypes, _) = run_scenario(clippings, vec![page_with(1, &["Other words"])]);
        assert!(subtypes.is_empty());
        let unprocessed = report.unprocessed();
        assert_eq!(unprocessed.len(), 2);
        assert_eq!(unprocessed[1].1, "Still mine");
    }

    #[test]
    fn test_refuses_to_overwrite_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("book.pdf");
        sample_document(1).save(&input).unwrap();

        let err = annotate_pdf(&input, &input, &[], &AnnotateOptions::default(), None)
            .err()
            .unwrap();
        assert!(matches!(err, AnnotateError::OutputOverwritesInput(_)));

        // Same file reached through a different spelling
        let dotted = dir.path().join(".").join("book.pdf");
        assert!(same_file(&input, &dotted));
        assert!(!same_file(&input, &dir.path().join("book_annotated.pdf")));
    }

    #[test]
    fn test_successful_run_leaves_input_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("book.pdf");
        let output = dir.path().join("book_annotated.pdf");
        sample_document(2).save(&input).unwrap();
        let before = std::fs::read(&input).unwrap();

        let options = AnnotateOptions::default();
        let clippings = "\
Book (Author)
- Your Highlight on page 1 | Added on Monday, January 1, 2024 10:00:00 AM

The quick fox
==========
Book (Author)
- Your Note on page 1 | Added on Monday, January 1, 2024 10:00:09 AM

Noted
==========
";
        let outcome = match_entries(parse_clippings(clippings, NoteTextSource::AllLines));
        let mut pdf = PdfDocument::from_parts(
            Document::load(&input).unwrap(),
            vec![page_with(1, &["The quick fox"])],
            &options,
        );
        let report = Annotator::new(&options).run(&mut pdf, &outcome.highlights).unwrap();
        assert!(!same_file(&input, &output));
        pdf.save(&output).unwrap();

        assert_eq!(report.highlights_added, 1);
        assert_eq!(report.notes_added, 1);
        assert_eq!(std::fs::read(&input).unwrap(), before);
        assert!(saved_subtypes(&input).is_empty());
        assert_eq!(saved_subtypes(&output).len(), 2);
    }

    #[test]
    fn test_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = annotate_pdf(
            &dir.path().join("absent.pdf"),
            &dir.path().join("out.pdf"),
            &[],
            &AnnotateOptions::default(),
            None,
        )
        .err()
        .unwrap();
        assert!(matches!(err, AnnotateError::MissingInput(_)));
        assert!(!dir.path().join("out.pdf").exists());
    }

    #[test]
    fn test_sample_document_shape() {
        let doc = sample_document(3);
        assert_eq!(doc.get_pages().len(), 3);
        let root = doc.trailer.get(b"Root").unwrap();
        assert!(matches!(root, Object::Reference(_)));
    }
}
