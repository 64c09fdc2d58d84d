//! Character encoding detection for clippings exports.

use encoding_rs::Encoding;

/// Detect encoding from a byte string and decode to UTF-8.
/// Tries BOM detection first, then strict UTF-8, then Windows-1252.
pub fn decode_to_utf8(bytes: &[u8]) -> (String, &'static str) {
    // Kindle devices write a UTF-8 BOM at the start of My Clippings.txt
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return (String::from_utf8_lossy(&bytes[3..]).to_string(), "UTF-8");
    }
    if bytes.starts_with(&[0xFF, 0xFE]) {
        let (result, _, _) = encoding_rs::UTF_16LE.decode(bytes);
        return (result.to_string(), "UTF-16LE");
    }
    if bytes.starts_with(&[0xFE, 0xFF]) {
        let (result, _, _) = encoding_rs::UTF_16BE.decode(bytes);
        return (result.to_string(), "UTF-16BE");
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => (s.to_string(), "UTF-8"),
        Err(_) => {
            let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            (result.to_string(), "Windows-1252")
        }
    }
}

/// Decode bytes using a specific encoding label (`"utf-8"`, `"latin1"`, ...).
/// Returns `None` for unknown labels.
pub fn decode_with_encoding(bytes: &[u8], encoding_name: &str) -> Option<String> {
    let encoding = Encoding::for_label(encoding_name.as_bytes())?;
    let (result, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        log::warn!(
            "Input is not valid {}; malformed sequences were replaced",
            encoding.name()
        );
    }
    Some(result.to_string())
}
