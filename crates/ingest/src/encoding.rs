//! Encoding detection for enterprise CSV exports.
//!
//! SAP, Excel, and IdP exports arrive in whatever encoding the exporting
//! workstation happened to use. The detector sniffs BOMs first, then
//! validates UTF-8, and falls back to Latin-1 so no non-empty input is
//! rejected outright.

use crate::error::IngestError;

const BOM_UTF8: &[u8] = &[0xEF, 0xBB, 0xBF];
const BOM_UTF16_LE: &[u8] = &[0xFF, 0xFE];
const BOM_UTF16_BE: &[u8] = &[0xFE, 0xFF];

/// Encoding detected on the input bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    Utf8,
    Utf8Bom,
    Utf16Le,
    Utf16Be,
    Latin1,
}

impl SourceEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Utf8Bom => "utf-8-bom",
            Self::Utf16Le => "utf-16le",
            Self::Utf16Be => "utf-16be",
            Self::Latin1 => "latin-1",
        }
    }
}

impl std::fmt::Display for SourceEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Detect the encoding of `data`, strip any BOM, and return the decoded text
/// along with the encoding tag.
///
/// Decoding never fails on non-empty input: invalid UTF-16 surrogates become
/// U+FFFD, an odd trailing byte is discarded, and input that is neither
/// BOM-tagged nor valid UTF-8 is read as Latin-1 (every byte maps to the
/// same code point).
pub fn detect_and_decode(data: &[u8]) -> Result<(String, SourceEncoding), IngestError> {
    if data.is_empty() {
        return Ok((String::new(), SourceEncoding::Utf8));
    }

    if let Some(rest) = data.strip_prefix(BOM_UTF8) {
        return Ok((
            String::from_utf8_lossy(rest).into_owned(),
            SourceEncoding::Utf8Bom,
        ));
    }

    if let Some(rest) = data.strip_prefix(BOM_UTF16_LE) {
        return Ok((decode_utf16(rest, u16::from_le_bytes), SourceEncoding::Utf16Le));
    }

    if let Some(rest) = data.strip_prefix(BOM_UTF16_BE) {
        return Ok((decode_utf16(rest, u16::from_be_bytes), SourceEncoding::Utf16Be));
    }

    if let Ok(text) = std::str::from_utf8(data) {
        return Ok((text.to_string(), SourceEncoding::Utf8));
    }

    Ok((decode_latin1(data), SourceEncoding::Latin1))
}

/// Decode UTF-16 code units with the given byte-pair reader. Surrogate pairs
/// are honored; lone surrogates become U+FFFD; an odd trailing byte is
/// dropped by the exact-pair chunking.
fn decode_utf16(data: &[u8], read: fn([u8; 2]) -> u16) -> String {
    let units = data.chunks_exact(2).map(|pair| read([pair[0], pair[1]]));
    char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

fn decode_latin1(data: &[u8]) -> String {
    data.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16le(text: &str) -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        bytes
    }

    fn utf16be(text: &str) -> Vec<u8> {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        bytes
    }

    #[test]
    fn empty_input_is_utf8() {
        let (text, enc) = detect_and_decode(b"").unwrap();
        assert_eq!(text, "");
        assert_eq!(enc, SourceEncoding::Utf8);
    }

    #[test]
    fn plain_utf8_passes_through() {
        let (text, enc) = detect_and_decode("émail,naïve".as_bytes()).unwrap();
        assert_eq!(text, "émail,naïve");
        assert_eq!(enc, SourceEncoding::Utf8);
    }

    #[test]
    fn utf8_bom_is_stripped() {
        let mut data = vec![0xEF, 0xBB, 0xBF];
        data.extend_from_slice(b"email,name");
        let (text, enc) = detect_and_decode(&data).unwrap();
        assert_eq!(text, "email,name");
        assert_eq!(enc, SourceEncoding::Utf8Bom);
    }

    #[test]
    fn utf16le_roundtrip() {
        let (text, enc) = detect_and_decode(&utf16le("email,Müller")).unwrap();
        assert_eq!(text, "email,Müller");
        assert_eq!(enc, SourceEncoding::Utf16Le);
    }

    #[test]
    fn utf16be_roundtrip() {
        let (text, enc) = detect_and_decode(&utf16be("email,Müller")).unwrap();
        assert_eq!(text, "email,Müller");
        assert_eq!(enc, SourceEncoding::Utf16Be);
    }

    #[test]
    fn utf16_surrogate_pair() {
        // U+1F600 needs a surrogate pair in UTF-16.
        let (text, _) = detect_and_decode(&utf16le("a😀b")).unwrap();
        assert_eq!(text, "a😀b");
    }

    #[test]
    fn utf16_lone_high_surrogate_becomes_replacement() {
        let mut data = vec![0xFF, 0xFE];
        data.extend_from_slice(&0xD800u16.to_le_bytes());
        data.extend_from_slice(&(b'x' as u16).to_le_bytes());
        let (text, _) = detect_and_decode(&data).unwrap();
        assert_eq!(text, "\u{FFFD}x");
    }

    #[test]
    fn utf16_lone_low_surrogate_becomes_replacement() {
        let mut data = vec![0xFF, 0xFE];
        data.extend_from_slice(&0xDC00u16.to_le_bytes());
        let (text, _) = detect_and_decode(&data).unwrap();
        assert_eq!(text, "\u{FFFD}");
    }

    #[test]
    fn utf16_odd_trailing_byte_is_discarded() {
        let mut data = utf16le("ab");
        data.push(0x41);
        let (text, _) = detect_and_decode(&data).unwrap();
        assert_eq!(text, "ab");
    }

    #[test]
    fn invalid_utf8_falls_back_to_latin1() {
        // 0xE9 is é in Latin-1 and invalid as a standalone UTF-8 byte.
        let (text, enc) = detect_and_decode(&[b'r', 0xE9, b's', b'u', b'm', 0xE9]).unwrap();
        assert_eq!(text, "résumé");
        assert_eq!(enc, SourceEncoding::Latin1);
    }

    #[test]
    fn latin1_high_bytes_map_to_same_code_points() {
        let (text, enc) = detect_and_decode(&[0x80, 0xFF]).unwrap();
        assert_eq!(text, "\u{0080}\u{00FF}");
        assert_eq!(enc, SourceEncoding::Latin1);
    }

    #[test]
    fn utf8_bom_with_invalid_body_soft_fails() {
        let mut data = vec![0xEF, 0xBB, 0xBF, b'a', 0xFF];
        data.push(b'b');
        let (text, enc) = detect_and_decode(&data).unwrap();
        assert_eq!(text, "a\u{FFFD}b");
        assert_eq!(enc, SourceEncoding::Utf8Bom);
    }
}
