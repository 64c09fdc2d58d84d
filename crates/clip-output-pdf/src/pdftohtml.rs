//! Run `pdftohtml -xml` and parse its XML output.
//!
//! pdftohtml (poppler) reports every text fragment of a page with its
//! bounding box. That is the geometry text search works against.

use std::collections::HashMap;
use std::path::Path;
use std::process::Command;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use clip_core::error::{AnnotateError, Result};

/// A positioned run of text on a page (one `<text>` element).
#[derive(Debug, Clone, PartialEq)]
pub struct TextFragment {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
    /// Plain text with inline markup (`<b>`, `<i>`, `<a>`) stripped.
    pub text: String,
}

/// Text layout of a single page, in pdftohtml's top-left coordinate space.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    /// 1-based page number.
    pub number: u32,
    pub width: f64,
    pub height: f64,
    pub fragments: Vec<TextFragment>,
}

/// Run `pdftohtml -xml` on a PDF and parse the per-page text layout.
pub fn extract_layout(pdf_path: &Path) -> Result<Vec<PageLayout>> {
    // Check that pdftohtml is available
    let which = Command::new("which")
        .arg("pdftohtml")
        .output()
        .map_err(|e| AnnotateError::Pdf(format!("Failed to check for pdftohtml: {}", e)))?;

    if !which.status.success() {
        return Err(AnnotateError::Pdf(
            "pdftohtml (poppler-utils) is required to search PDF text. \
             Install with: brew install poppler (macOS) or apt install poppler-utils (Linux)"
                .to_string(),
        ));
    }

    let tmp_dir = tempfile::TempDir::new()
        .map_err(|e| AnnotateError::Pdf(format!("Failed to create temp dir: {}", e)))?;

    let output_base = tmp_dir.path().join("layout");
    let output_base_str = output_base
        .to_str()
        .ok_or_else(|| AnnotateError::Pdf("Invalid temp path".to_string()))?;

    log::info!("Running pdftohtml -xml on {}...", pdf_path.display());

    let output = Command::new("pdftohtml")
        .arg("-xml")
        .arg("-enc")
        .arg("UTF-8")
        .arg("-i") // text positions only, no image extraction
        .arg("-noframes")
        .arg("-nomerge")
        .arg("-nodrm")
        .arg("-q")
        .arg(pdf_path.as_os_str())
        .arg(output_base_str)
        .output()
        .map_err(|e| AnnotateError::Pdf(format!("Failed to run pdftohtml: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AnnotateError::Pdf(format!("pdftohtml failed: {}", stderr)));
    }

    let xml_path = tmp_dir.path().join("layout.xml");
    let xml_content = std::fs::read_to_string(&xml_path).map_err(|e| {
        AnnotateError::Pdf(format!(
            "Failed to read pdftohtml XML output at {}: {}",
            xml_path.display(),
            e
        ))
    })?;

    let pages = parse_pdftohtml_xml(&xml_content)?;
    log::info!(
        "pdftohtml: {} pages, {} text fragments",
        pages.len(),
        pages.iter().map(|p| p.fragments.len()).sum::<usize>()
    );

    Ok(pages)
}

/// Parse the pdftohtml XML output into page layouts.
pub fn parse_pdftohtml_xml(xml: &str) -> Result<Vec<PageLayout>> {
    let mut reader = Reader::from_str(xml);
    let mut pages: Vec<PageLayout> = Vec::new();

    let mut current_page: Option<PageLayout> = None;
    let mut current_text: Option<TextFragment> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e).as_str() {
                "page" => {
                    let attrs = parse_attrs(e);
                    current_page = Some(PageLayout {
                        number: attr_or(&attrs, "number", 0),
                        width: attr_or(&attrs, "width", 0.0),
                        height: attr_or(&attrs, "height", 0.0),
                        fragments: Vec::new(),
                    });
                }
                "text" => {
                    let attrs = parse_attrs(e);
                    current_text = Some(TextFragment {
                        top: attr_or(&attrs, "top", 0.0),
                        left: attr_or(&attrs, "left", 0.0),
                        width: attr_or(&attrs, "width", 0.0),
                        height: attr_or(&attrs, "height", 0.0),
                        text: String::new(),
                    });
                }
                // Inline <b>/<i>/<a> inside <text>: only their text matters
                _ => {}
            },
            Ok(Event::Text(ref e)) => {
                if let Some(ref mut fragment) = current_text {
                    let text = e
                        .unescape()
                        .map_err(|err| AnnotateError::Xml(err.to_string()))?;
                    fragment.text.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => {
                let local = e.local_name();
                match std::str::from_utf8(local.as_ref()).unwrap_or("") {
                    "page" => {
                        if let Some(page) = current_page.take() {
                            pages.push(page);
                        }
                    }
                    "text" => {
                        if let (Some(fragment), Some(page)) =
                            (current_text.take(), current_page.as_mut())
                        {
                            if !fragment.text.trim().is_empty() {
                                page.fragments.push(fragment);
                            }
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("XML parse warning: {}", e);
                break;
            }
            _ => {}
        }
    }

    Ok(pages)
}

fn local_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).to_string()
}

/// Helper to parse attributes from a quick-xml event.
fn parse_attrs(e: &BytesStart) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).to_string();
        let value = String::from_utf8_lossy(&attr.value).to_string();
        map.insert(key, value);
    }
    map
}

fn attr_or<T: std::str::FromStr>(attrs: &HashMap<String, String>, key: &str, default: T) -> T {
    attrs
        .get(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
