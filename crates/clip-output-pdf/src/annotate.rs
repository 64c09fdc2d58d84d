//! Place matched highlights and their notes onto an annotation target.

use clip_core::entry::MatchedHighlight;
use clip_core::error::Result;
use clip_core::options::{AnnotateOptions, NotePlacement};
use clip_core::report::AnnotationReport;
use clip_core::target::{AnnotationTarget, Point, ProgressReporter, Rect};

/// Drives an [`AnnotationTarget`] through a list of matched highlights.
pub struct Annotator {
    placement: NotePlacement,
    spacing: f64,
    margin: f64,
    progress_reporter: Option<ProgressReporter>,
}

impl Annotator {
    pub fn new(options: &AnnotateOptions) -> Self {
        Self {
            placement: options.note_placement,
            spacing: options.note_spacing,
            margin: options.note_margin,
            progress_reporter: None,
        }
    }

    /// Set a progress reporter callback.
    pub fn progress_reporter(mut self, reporter: ProgressReporter) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Annotate every highlight that can be found, in list order.
    ///
    /// A highlight is searched for on its own page when that page exists,
    /// otherwise on every page. Only the first region of the first page that
    /// matches is highlighted. Highlights that are never found are returned
    /// in [`AnnotationReport::unplaced`] together with their notes.
    pub fn run<T: AnnotationTarget>(
        &self,
        target: &mut T,
        highlights: &[MatchedHighlight],
    ) -> Result<AnnotationReport> {
        let mut report = AnnotationReport::default();
        let total = highlights.len();
        let page_count = target.page_count();

        self.report_progress(0.0, "Annotating document...");

        for (idx, hl) in highlights.iter().enumerate() {
            if hl.text.is_empty() {
                log::debug!("Skipping highlight with no text (page {:?})", hl.page);
                continue;
            }

            match find_first(target, page_count, hl)? {
                Some((page_index, rect)) => {
                    target.add_highlight(page_index, &rect)?;
                    report.highlights_added += 1;

                    for (n, note) in hl.notes.iter().enumerate() {
                        let at = self.note_position(&rect, n);
                        target.add_note(page_index, at, &note.text)?;
                        report.notes_added += 1;
                    }
                    log::debug!(
                        "Placed highlight on page {} with {} note(s)",
                        page_index + 1,
                        hl.notes.len()
                    );
                }
                None => {
                    log::debug!("Highlight not found (page {:?}): {}", hl.page, hl.text);
                    report.unplaced.push(hl.clone());
                }
            }

            let fraction = (idx + 1) as f64 / total as f64;
            self.report_progress(
                fraction,
                &format!("Processed highlight {}/{}", idx + 1, total),
            );
        }

        log::info!(
            "Added {} highlights and {} notes ({} highlights not found)",
            report.highlights_added,
            report.notes_added,
            report.unplaced.len()
        );

        Ok(report)
    }

    /// Top-left corner of the `n`th note marker attached to `rect`.
    fn note_position(&self, rect: &Rect, n: usize) -> Point {
        match self.placement {
            NotePlacement::Above => Point::new(rect.x0, rect.y0 - self.spacing * (n + 1) as f64),
            NotePlacement::Right => Point::new(rect.x1 + self.margin, rect.y0 + self.spacing * n as f64),
        }
    }

    fn report_progress(&self, fraction: f64, message: &str) {
        if let Some(ref reporter) = self.progress_reporter {
            reporter(fraction, message);
        }
    }
}

/// The first page in scope where the highlight's text occurs, and its first region.
fn find_first<T: AnnotationTarget>(
    target: &T,
    page_count: usize,
    hl: &MatchedHighlight,
) -> Result<Option<(usize, Rect)>> {
    let scope: Vec<usize> = match hl.page {
        Some(page) if page >= 1 && (page as usize) <= page_count => vec![page as usize - 1],
        _ => (0..page_count).collect(),
    };

    for page_index in scope {
        if let Some(rect) = target.search_for(page_index, &hl.text)?.into_iter().next() {
            return Ok(Some((page_index, rect)));
        }
    }
    Ok(None)
}
