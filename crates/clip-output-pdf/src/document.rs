//! A PDF opened for annotation: the lopdf object tree plus the pdftohtml
//! text layout used for searching.

use std::path::Path;

use lopdf::{Document, ObjectId};

use clip_core::error::{AnnotateError, Result};
use clip_core::options::AnnotateOptions;
use clip_core::target::{AnnotationTarget, Point, Rect};

use crate::pdftohtml::{self, PageLayout};
use crate::search::PageText;
use crate::writer;

/// Per-page mapping from layout space (top-left origin, pdftohtml units)
/// to PDF user space.
#[derive(Debug, Clone, Copy)]
struct PageTransform {
    media_box: [f32; 4],
    scale_x: f64,
    scale_y: f64,
}

impl PageTransform {
    fn new(media_box: [f32; 4], layout: Option<&PageLayout>) -> Self {
        let box_w = (media_box[2] - media_box[0]) as f64;
        let box_h = (media_box[3] - media_box[1]) as f64;
        let (scale_x, scale_y) = match layout {
            Some(l) if l.width > 0.0 && l.height > 0.0 => (box_w / l.width, box_h / l.height),
            _ => (1.0, 1.0),
        };
        Self {
            media_box,
            scale_x,
            scale_y,
        }
    }

    fn x(&self, x: f64) -> f32 {
        (self.media_box[0] as f64 + x * self.scale_x) as f32
    }

    fn y(&self, y: f64) -> f32 {
        (self.media_box[3] as f64 - y * self.scale_y) as f32
    }

    fn rect(&self, r: &Rect) -> [f32; 4] {
        [self.x(r.x0), self.y(r.y1), self.x(r.x1), self.y(r.y0)]
    }
}

/// A PDF document that can be searched and annotated.
pub struct PdfDocument {
    doc: Document,
    /// Page object ids in page order.
    page_ids: Vec<ObjectId>,
    /// Searchable text per page index; `None` when pdftohtml reported nothing.
    pages: Vec<Option<PageText>>,
    transforms: Vec<PageTransform>,
    highlight_color: [f32; 3],
    note_color: [f32; 3],
    note_icon: String,
}

impl PdfDocument {
    /// Load a PDF and extract its text layout.
    pub fn open(path: &Path, options: &AnnotateOptions) -> Result<Self> {
        if !path.is_file() {
            return Err(AnnotateError::MissingInput(path.to_path_buf()));
        }

        log::info!("Reading PDF: {}", path.display());
        let doc = Document::load(path)
            .map_err(|e| AnnotateError::Pdf(format!("Failed to load PDF: {}", e)))?;
        let layouts = pdftohtml::extract_layout(path)?;

        Ok(Self::from_parts(doc, layouts, options))
    }

    /// Build from an already-loaded document and its page layouts. Each
    /// page's text is folded for searching here, once.
    pub fn from_parts(doc: Document, layouts: Vec<PageLayout>, options: &AnnotateOptions) -> Self {
        let page_ids: Vec<ObjectId> = doc.get_pages().values().copied().collect();

        let mut by_index: Vec<Option<PageLayout>> = vec![None; page_ids.len()];
        for layout in layouts {
            match (layout.number as usize).checked_sub(1) {
                Some(idx) if idx < by_index.len() => by_index[idx] = Some(layout),
                _ => log::warn!(
                    "Ignoring text layout for page {} (document has {} pages)",
                    layout.number,
                    page_ids.len()
                ),
            }
        }

        let transforms = page_ids
            .iter()
            .zip(by_index.iter())
            .map(|(id, layout)| {
                PageTransform::new(writer::page_media_box(&doc, *id), layout.as_ref())
            })
            .collect();

        let pages = by_index
            .into_iter()
            .map(|layout| layout.map(PageText::new))
            .collect();

        log::info!("PDF has {} pages", page_ids.len());

        Self {
            doc,
            page_ids,
            pages,
            transforms,
            highlight_color: options.highlight_color,
            note_color: options.note_color,
            note_icon: options.note_icon.clone(),
        }
    }

    /// Write the annotated document to `output`.
    pub fn save(&mut self, output: &Path) -> Result<()> {
        writer::save_atomically(&mut self.doc, output)?;
        log::debug!("Saved annotated PDF to {}", output.display());
        Ok(())
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    fn page_id(&self, page_index: usize) -> Result<ObjectId> {
        self.page_ids.get(page_index).copied().ok_or_else(|| {
            AnnotateError::Pdf(format!(
                "Page index {} out of range ({} pages)",
                page_index,
                self.page_ids.len()
            ))
        })
    }
}

impl AnnotationTarget for PdfDocument {
    fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn search_for(&self, page_index: usize, needle: &str) -> Result<Vec<Rect>> {
        Ok(match self.pages.get(page_index) {
            Some(Some(text)) => text.search(needle),
            _ => Vec::new(),
        })
    }

    fn add_highlight(&mut self, page_index: usize, rect: &Rect) -> Result<()> {
        let page_id = self.page_id(page_index)?;
        let pdf_rect = self.transforms[page_index].rect(rect);
        writer::add_highlight_annotation(&mut self.doc, page_id, pdf_rect, self.highlight_color)?;
        Ok(())
    }

    fn add_note(&mut self, page_index: usize, at: Point, text: &str) -> Result<()> {
        let page_id = self.page_id(page_index)?;
        let transform = self.transforms[page_index];
        writer::add_text_annotation(
            &mut self.doc,
            page_id,
            transform.x(at.x),
            transform.y(at.y),
            text,
            &self.note_icon,
            self.note_color,
        )?;
        Ok(())
    }
}
