//! Kindle clippings input: reads a `My Clippings.txt` export into entries.

pub mod header;

use std::path::Path;

use clip_core::entry::Entry;
use clip_core::error::{AnnotateError, Result};
use clip_core::options::{AnnotateOptions, NoteTextSource};
use clip_utils::encoding;
use clip_utils::text::collapse_whitespace;

/// Line separating clipping blocks.
pub const DELIMITER: &str = "==========";

/// Read and parse a clippings file, applying the encoding and book-title
/// options.
pub fn read_clippings(path: &Path, options: &AnnotateOptions) -> Result<Vec<Entry>> {
    if !path.is_file() {
        return Err(AnnotateError::MissingInput(path.to_path_buf()));
    }

    log::info!("Reading clippings: {}", path.display());
    let bytes = std::fs::read(path)?;

    let raw = match options.input_encoding.as_deref() {
        Some(label) => encoding::decode_with_encoding(&bytes, label).ok_or_else(|| {
            AnnotateError::Encoding(format!("Unknown encoding label: {}", label))
        })?,
        None => {
            let (text, detected) = encoding::decode_to_utf8(&bytes);
            log::debug!("Clippings decoded as {}", detected);
            text
        }
    };

    let mut entries = parse_clippings(&raw, options.note_text);

    if let Some(ref wanted) = options.book_title {
        let wanted = wanted.to_lowercase();
        let before = entries.len();
        entries.retain(|e| e.title.to_lowercase().contains(&wanted));
        log::info!(
            "Kept {} of {} entries matching book title {:?}",
            entries.len(),
            before,
            wanted
        );
    }

    log::info!("{} highlights/notes found in clippings", entries.len());
    Ok(entries)
}

/// Parse the raw text of a clippings export. Malformed blocks are skipped.
pub fn parse_clippings(raw: &str, source: NoteTextSource) -> Vec<Entry> {
    let mut entries = Vec::new();
    let mut skipped = 0usize;

    for block in raw.split(DELIMITER) {
        let block = block.trim();
        if block.is_empty() {
            continue;
        }
        match parse_block(block, source) {
            Some(entry) => entries.push(entry),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        log::debug!("Skipped {} clipping blocks without a highlight/note header", skipped);
    }

    entries
}

/// Parse one trimmed block: title line, header line, then the clipping text.
fn parse_block(block: &str, source: NoteTextSource) -> Option<Entry> {
    let lines: Vec<&str> = block.lines().collect();
    if lines.len() < 2 {
        return None;
    }

    let header = header::parse_header(lines[1].trim())?;
    let body = &lines[2..];

    let text = match source {
        NoteTextSource::AllLines => body
            .iter()
            .filter(|l| !l.trim().is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("\n"),
        NoteTextSource::LastLine => body
            .iter()
            .rev()
            .find(|l| !l.trim().is_empty())
            .map(|l| l.to_string())
            .unwrap_or_default(),
    };

    Some(Entry {
        title: collapse_whitespace(lines[0]),
        kind: header.kind,
        text: collapse_whitespace(&text),
        page: header.page,
        location: header.location,
        timestamp: header.timestamp,
    })
}
