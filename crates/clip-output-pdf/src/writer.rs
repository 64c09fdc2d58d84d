//! lopdf helpers: page boxes, annotation dictionaries, and saving.
//!
//! Everything here works in PDF user space (origin bottom-left, y up).

use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use clip_core::error::{AnnotateError, Result};

/// Annotation flag: print the annotation with the page.
const FLAG_PRINT: i64 = 4;

/// Side length of a text-note icon, in points.
pub const NOTE_ICON_SIZE: f32 = 20.0;

/// US Letter, used when a page tree carries no MediaBox at all.
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// The page's MediaBox as `[x0, y0, x1, y1]`, following `/Parent` for
/// inherited values.
pub fn page_media_box(doc: &Document, page_id: ObjectId) -> [f32; 4] {
    let mut current = Some(page_id);
    // Bounded walk in case of a cyclic /Parent chain
    for _ in 0..32 {
        let Some(id) = current else { break };
        let Ok(dict) = doc.get_dictionary(id) else {
            break;
        };
        if let Ok(media_box) = dict.get(b"MediaBox") {
            if let Some(bounds) = number_array(doc, media_box) {
                return bounds;
            }
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }
    DEFAULT_MEDIA_BOX
}

/// Read a four-number array, resolving one level of indirection.
fn number_array(doc: &Document, obj: &Object) -> Option<[f32; 4]> {
    let arr = match obj {
        Object::Array(arr) => arr,
        Object::Reference(id) => match doc.get_object(*id) {
            Ok(Object::Array(arr)) => arr,
            _ => return None,
        },
        _ => return None,
    };

    let mut bounds = Vec::with_capacity(4);
    for obj in arr {
        match obj {
            Object::Integer(i) => bounds.push(*i as f32),
            Object::Real(f) => bounds.push(*f),
            _ => {}
        }
    }
    if bounds.len() == 4 {
        Some([
            bounds[0].min(bounds[2]),
            bounds[1].min(bounds[3]),
            bounds[0].max(bounds[2]),
            bounds[1].max(bounds[3]),
        ])
    } else {
        None
    }
}

fn real_array(values: &[f32]) -> Object {
    Object::Array(values.iter().map(|v| Object::Real(*v)).collect())
}

/// Encode a text string for an annotation: literal for ASCII, UTF-16BE with
/// a byte-order mark otherwise.
pub fn encode_text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Add a highlight annotation covering `rect` (`[x0, y0, x1, y1]`, PDF space).
pub fn add_highlight_annotation(
    doc: &mut Document,
    page_id: ObjectId,
    rect: [f32; 4],
    color: [f32; 3],
) -> Result<ObjectId> {
    let [x0, y0, x1, y1] = rect;
    let appearance_id = doc.add_object(highlight_appearance(rect, color));

    let mut appearance = Dictionary::new();
    appearance.set("N", Object::Reference(appearance_id));

    let mut annot = Dictionary::new();
    annot.set("Type", Object::Name(b"Annot".to_vec()));
    annot.set("Subtype", Object::Name(b"Highlight".to_vec()));
    annot.set("Rect", real_array(&rect));
    // Quad order: upper-left, upper-right, lower-left, lower-right
    annot.set("QuadPoints", real_array(&[x0, y1, x1, y1, x0, y0, x1, y0]));
    annot.set("C", real_array(&color));
    annot.set("F", Object::Integer(FLAG_PRINT));
    annot.set("P", Object::Reference(page_id));
    annot.set("AP", Object::Dictionary(appearance));

    let annot_id = doc.add_object(annot);
    append_annotation(doc, page_id, annot_id)?;
    Ok(annot_id)
}

/// Appearance stream for a highlight: a multiply-blended filled rectangle.
fn highlight_appearance(rect: [f32; 4], color: [f32; 3]) -> Stream {
    let [x0, y0, x1, y1] = rect;
    let [r, g, b] = color;

    let mut blend = Dictionary::new();
    blend.set("Type", Object::Name(b"ExtGState".to_vec()));
    blend.set("BM", Object::Name(b"Multiply".to_vec()));
    let mut ext_g_state = Dictionary::new();
    ext_g_state.set("H0", Object::Dictionary(blend));
    let mut resources = Dictionary::new();
    resources.set("ExtGState", Object::Dictionary(ext_g_state));

    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"XObject".to_vec()));
    dict.set("Subtype", Object::Name(b"Form".to_vec()));
    dict.set("BBox", real_array(&rect));
    dict.set("Resources", Object::Dictionary(resources));

    let content = format!(
        "/H0 gs {} {} {} rg {} {} {} {} re f\n",
        r,
        g,
        b,
        x0,
        y0,
        x1 - x0,
        y1 - y0
    );
    Stream::new(dict, content.into_bytes())
}

/// Add a text (sticky-note) annotation whose icon's top-left corner is at
/// `(x, top)` in PDF space.
pub fn add_text_annotation(
    doc: &mut Document,
    page_id: ObjectId,
    x: f32,
    top: f32,
    contents: &str,
    icon: &str,
    color: [f32; 3],
) -> Result<ObjectId> {
    let mut annot = Dictionary::new();
    annot.set("Type", Object::Name(b"Annot".to_vec()));
    annot.set("Subtype", Object::Name(b"Text".to_vec()));
    annot.set(
        "Rect",
        real_array(&[x, top - NOTE_ICON_SIZE, x + NOTE_ICON_SIZE, top]),
    );
    annot.set("Contents", encode_text_string(contents));
    annot.set("Name", Object::Name(icon.as_bytes().to_vec()));
    annot.set("Open", Object::Boolean(false));
    annot.set("C", real_array(&color));
    annot.set("F", Object::Integer(FLAG_PRINT));
    annot.set("P", Object::Reference(page_id));

    let annot_id = doc.add_object(annot);
    append_annotation(doc, page_id, annot_id)?;
    Ok(annot_id)
}

/// Append an annotation reference to the page's `/Annots`, which may be
/// absent, an inline array, or a reference to an array.
fn append_annotation(doc: &mut Document, page_id: ObjectId, annot_id: ObjectId) -> Result<()> {
    let existing = doc
        .get_dictionary(page_id)
        .map_err(|e| AnnotateError::Pdf(format!("Page {:?} is not a dictionary: {}", page_id, e)))?
        .get(b"Annots")
        .ok()
        .cloned();

    if let Some(Object::Reference(array_id)) = existing {
        if let Ok(Object::Array(arr)) = doc.get_object_mut(array_id) {
            arr.push(Object::Reference(annot_id));
            return Ok(());
        }
        log::warn!("Page {:?} has a dangling /Annots reference; replacing it", page_id);
    }

    let mut annots = match existing {
        Some(Object::Array(arr)) => arr,
        _ => Vec::new(),
    };
    annots.push(Object::Reference(annot_id));

    doc.get_dictionary_mut(page_id)
        .map_err(|e| AnnotateError::Pdf(format!("Page {:?} is not a dictionary: {}", page_id, e)))?
        .set("Annots", Object::Array(annots));
    Ok(())
}

/// Write the document to `output` through a temporary file in the same
/// directory, so a failed save never leaves a truncated PDF behind.
pub fn save_atomically(doc: &mut Document, output: &Path) -> Result<()> {
    let dir = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
    doc.save_to(&mut tmp)
        .map_err(|e| AnnotateError::Pdf(format!("Failed to write PDF: {}", e)))?;
    tmp.persist(output)
        .map_err(|e| AnnotateError::Io(e.error))?;
    Ok(())
}
