//! Byte-level decoding of organ definition files.

use odf_model::TextEncoding;

pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decodes `bytes` and reports the encoding that was used.
///
/// A UTF-8 byte order mark followed by valid UTF-8 wins; otherwise valid
/// UTF-8 is taken as such and anything else is read as ISO-8859-1, which
/// cannot fail and writes back the same bytes.
pub fn decode(bytes: &[u8]) -> (String, TextEncoding) {
    if let Some(rest) = bytes.strip_prefix(UTF8_BOM)
        && let Ok(text) = std::str::from_utf8(rest)
    {
        return (text.to_string(), TextEncoding::Utf8 { bom: true });
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => (text.to_string(), TextEncoding::Utf8 { bom: false }),
        Err(_) => (latin1_to_string(bytes), TextEncoding::Latin1),
    }
}

fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin1_fallback_maps_bytes_to_code_points() {
        let (text, encoding) = decode(b"Name=Bourdon \xE0 chemin\xE9e");
        assert_eq!(encoding, TextEncoding::Latin1);
        assert_eq!(text, "Name=Bourdon à cheminée");
    }

    #[test]
    fn bom_is_stripped() {
        let (text, encoding) = decode(b"\xEF\xBB\xBF[Organ]\n");
        assert_eq!(encoding, TextEncoding::Utf8 { bom: true });
        assert_eq!(text, "[Organ]\n");
    }
}
