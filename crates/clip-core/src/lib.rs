//! Shared types for kindle-annotate: clipping records, options, errors and
//! the document capability the annotator writes through.

pub mod entry;
pub mod error;
pub mod options;
pub mod report;
pub mod target;
