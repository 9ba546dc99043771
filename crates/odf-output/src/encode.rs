use odf_model::TextEncoding;

use crate::error::OutputError;

pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Encodes serialized text with the document's encoding.
pub fn encode(text: &str, encoding: TextEncoding) -> Result<Vec<u8>, OutputError> {
    match encoding {
        TextEncoding::Utf8 { bom } => {
            let mut bytes = Vec::with_capacity(text.len() + UTF8_BOM.len());
            if bom {
                bytes.extend_from_slice(UTF8_BOM);
            }
            bytes.extend_from_slice(text.as_bytes());
            Ok(bytes)
        }
        TextEncoding::Latin1 => {
            let mut bytes = Vec::with_capacity(text.len());
            let mut line = 1;
            for character in text.chars() {
                let Ok(byte) = u8::try_from(u32::from(character)) else {
                    return Err(OutputError::Unrepresentable { character, line });
                };
                if character == '\n' {
                    line += 1;
                }
                bytes.push(byte);
            }
            Ok(bytes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin1_maps_code_points_to_bytes() {
        let bytes = encode("Pr\u{e9}stant\n", TextEncoding::Latin1).expect("latin1");
        assert_eq!(bytes, b"Pr\xE9stant\n");
    }

    #[test]
    fn latin1_rejects_wide_characters_with_their_line() {
        let error = encode("a\nb\u{20ac}\n", TextEncoding::Latin1).expect_err("euro sign");
        assert!(matches!(
            error,
            OutputError::Unrepresentable { character: '\u{20ac}', line: 2 }
        ));
    }

    #[test]
    fn utf8_bom_is_restored() {
        let bytes = encode("x", TextEncoding::Utf8 { bom: true }).expect("utf8");
        assert_eq!(bytes, b"\xEF\xBB\xBFx");
    }
}
