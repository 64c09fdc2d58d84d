use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnnotateError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("Output path {} is the same as the input", .0.display())]
    OutputOverwritesInput(PathBuf),

    #[error("XML parsing error: {0}")]
    Xml(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Encoding error: {0}")]
    Encoding(String),
}

pub type Result<T> = std::result::Result<T, AnnotateError>;
