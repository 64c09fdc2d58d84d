//! The document capability the annotator drives.
//!
//! Geometry is expressed in page space with the origin at the top-left
//! corner and y growing downward. Backends convert to their own coordinate
//! system when they write annotations.

use crate::error::Result;

/// Progress reporter callback type.
pub type ProgressReporter = Box<dyn Fn(f64, &str)>;

/// An axis-aligned rectangle on a page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }
}

/// A position on a page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A paginated document that can find text and take annotations.
///
/// Page indices are 0-based.
pub trait AnnotationTarget {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Every region on the page where `needle` occurs, in reading order.
    /// An empty result means the text is not on this page.
    fn search_for(&self, page_index: usize, needle: &str) -> Result<Vec<Rect>>;

    /// Overlay a highlight mark on `rect`.
    fn add_highlight(&mut self, page_index: usize, rect: &Rect) -> Result<()>;

    /// Add a small text-note marker whose top-left corner is at `at`.
    fn add_note(&mut self, page_index: usize, at: Point, text: &str) -> Result<()>;
}
