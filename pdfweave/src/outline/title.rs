//! Outline title decoding and normalization.
//!
//! PDF text strings come in two encodings: PDFDocEncoding (a Latin-1
//! superset) and UTF-16 with a byte-order mark. Many real documents store
//! outline titles in UTF-16 but are later read back as narrow characters,
//! which leaves BOM pairs (þÿ / ÿþ) and interleaved NUL bytes embedded in
//! the "decoded" string. Decoding here handles the honest encodings and
//! then strips those artifacts.

/// Decode a raw title byte string into clean text.
pub fn decode_title(bytes: &[u8]) -> String {
    let decoded = if bytes.starts_with(&[0xFE, 0xFF]) {
        utf16_to_string(&bytes[2..], true)
    } else if bytes.starts_with(&[0xFF, 0xFE]) {
        utf16_to_string(&bytes[2..], false)
    } else {
        match std::str::from_utf8(bytes) {
            Ok(s) => s.to_owned(),
            // PDFDocEncoding is close enough to Latin-1 for titles.
            Err(_) => bytes.iter().map(|&b| b as char).collect(),
        }
    };
    normalize_title(&decoded)
}

/// Strip BOM pairs and interleaved NUL artifacts from a decoded title.
pub fn normalize_title(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let chars: Vec<char> = raw.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        // BOM pairs misread as Latin-1 (þÿ or ÿþ), anywhere in the string.
        if i + 1 < chars.len()
            && ((c == '\u{00FE}' && chars[i + 1] == '\u{00FF}')
                || (c == '\u{00FF}' && chars[i + 1] == '\u{00FE}'))
        {
            i += 2;
            continue;
        }
        if c == '\u{FEFF}' || c == '\0' {
            i += 1;
            continue;
        }
        out.push(c);
        i += 1;
    }
    out
}

/// Encode a title for storage in an outline dictionary.
///
/// ASCII stays a literal string; anything else becomes UTF-16BE with a BOM
/// so that [`decode_title`] round-trips it exactly.
pub fn encode_title(title: &str) -> Vec<u8> {
    if title.is_ascii() {
        return title.as_bytes().to_vec();
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in title.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    bytes
}

fn utf16_to_string(bytes: &[u8], big_endian: bool) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| {
            if big_endian {
                u16::from_be_bytes([pair[0], pair[1]])
            } else {
                u16::from_le_bytes([pair[0], pair[1]])
            }
        })
        .collect();
    String::from_utf16_lossy(&units)
}
