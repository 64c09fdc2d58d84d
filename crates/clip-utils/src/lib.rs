//! Text helpers shared by the clippings parser and the PDF search backend.

pub mod encoding;
pub mod text;
