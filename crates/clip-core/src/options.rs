//! Options shared by the parser, matcher and annotator.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// All options controlling an annotation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotateOptions {
    // -- General --
    pub verbose: u8,

    // -- Clippings --
    /// Encoding label for the clippings file. Auto-detected when unset.
    pub input_encoding: Option<String>,
    /// Keep only clippings whose title line contains this text.
    pub book_title: Option<String>,
    pub note_text: NoteTextSource,

    // -- Placement --
    pub note_placement: NotePlacement,
    /// Vertical distance between stacked note markers, in points.
    pub note_spacing: f64,
    /// Horizontal gap between a highlight and a note placed to its right.
    pub note_margin: f64,

    // -- Appearance --
    #[serde(serialize_with = "serialize_color", deserialize_with = "deserialize_color")]
    pub highlight_color: [f32; 3],
    #[serde(serialize_with = "serialize_color", deserialize_with = "deserialize_color")]
    pub note_color: [f32; 3],
    /// Icon name for text annotations (`Note`, `Comment`, `Key`, ...).
    pub note_icon: String,

    // -- Output --
    /// Appended to the PDF file stem to build the default output name.
    pub output_suffix: String,
}

impl Default for AnnotateOptions {
    fn default() -> Self {
        Self {
            verbose: 0,
            input_encoding: None,
            book_title: None,
            note_text: NoteTextSource::default(),
            note_placement: NotePlacement::default(),
            note_spacing: 15.0,
            note_margin: 10.0,
            highlight_color: [1.0, 1.0, 0.0],
            note_color: [1.0, 0.843, 0.0],
            note_icon: "Note".to_string(),
            output_suffix: "_annotated".to_string(),
        }
    }
}

/// Serialize an RGB triple as `"#RRGGBB"`.
fn serialize_color<S>(val: &[f32; 3], s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_str(&format_color(*val))
}

/// Deserialize an RGB triple from `"#RRGGBB"`.
fn deserialize_color<'de, D>(d: D) -> Result<[f32; 3], D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(d)?;
    parse_color(&s).ok_or_else(|| {
        serde::de::Error::custom("expected colour in '#RRGGBB' form (e.g. '#FFFF00')")
    })
}

/// Parse `"#RRGGBB"` (the leading `#` is optional) into RGB components in `0.0..=1.0`.
pub fn parse_color(s: &str) -> Option<[f32; 3]> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let mut rgb = [0.0f32; 3];
    for (i, chan) in rgb.iter_mut().enumerate() {
        let byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
        *chan = byte as f32 / 255.0;
    }
    Some(rgb)
}

pub fn format_color(rgb: [f32; 3]) -> String {
    let [r, g, b] = rgb.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
    format!("#{:02X}{:02X}{:02X}", r, g, b)
}

/// Which lines of a clipping block become the entry text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoteTextSource {
    /// Every non-empty line after the header, joined.
    #[default]
    AllLines,
    /// Only the last non-empty line of the block.
    LastLine,
}

/// Where note markers go relative to their highlight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotePlacement {
    /// Stacked upwards from the top-left corner of the highlight.
    #[default]
    Above,
    /// To the right of the highlight, stacked downwards.
    Right,
}
