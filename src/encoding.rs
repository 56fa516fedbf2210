//! Character decoding of payloads returned by the translation service.
//!
//! Flat resources arrive as UTF-16 (little-endian unless a BOM says
//! otherwise); plural resources and anything else arrive as UTF-8.

use encoding_rs::{Encoding, UTF_8, UTF_16LE};

use crate::{error::Error, formats::ResourceKind};

/// Decodes a downloaded payload for a resource of `kind`.
pub fn decode_payload(bytes: &[u8], kind: ResourceKind) -> Result<String, Error> {
    let fallback = match kind {
        ResourceKind::Strings => UTF_16LE,
        ResourceKind::Stringsdict => UTF_8,
    };
    decode_with_fallback(bytes, fallback)
}

/// Decodes UTF-8 text, dropping a leading BOM.
pub fn decode_utf8(bytes: &[u8]) -> Result<String, Error> {
    decode_with_fallback(bytes, UTF_8)
}

fn decode_with_fallback(bytes: &[u8], fallback: &'static Encoding) -> Result<String, Error> {
    let (encoding, bom_length) = Encoding::for_bom(bytes).unwrap_or((fallback, 0));
    encoding
        .decode_without_bom_handling_and_without_replacement(&bytes[bom_length..])
        .map(|text| text.into_owned())
        .ok_or(Error::Decoding {
            encoding: encoding.name(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16le(text: &str, bom: bool) -> Vec<u8> {
        let mut bytes = if bom { vec![0xFF, 0xFE] } else { Vec::new() };
        bytes.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
        bytes
    }

    #[test]
    fn test_strings_payload_is_utf16() {
        let text = "/* c */\n\"k\"=\"caf\u{e9}\";";
        assert_eq!(decode_payload(&utf16le(text, true), ResourceKind::Strings).unwrap(), text);
        assert_eq!(decode_payload(&utf16le(text, false), ResourceKind::Strings).unwrap(), text);
    }

    #[test]
    fn test_big_endian_bom_is_honoured() {
        let mut bytes = vec![0xFE, 0xFF];
        bytes.extend("ok".encode_utf16().flat_map(u16::to_be_bytes));
        assert_eq!(decode_payload(&bytes, ResourceKind::Strings).unwrap(), "ok");
    }

    #[test]
    fn test_stringsdict_payload_is_utf8() {
        let text = "<plist>\u{2026}</plist>";
        assert_eq!(
            decode_payload(text.as_bytes(), ResourceKind::Stringsdict).unwrap(),
            text
        );
        let mut with_bom = vec![0xEF, 0xBB, 0xBF];
        with_bom.extend(text.as_bytes());
        assert_eq!(decode_utf8(&with_bom).unwrap(), text);
    }

    #[test]
    fn test_invalid_bytes_are_an_error() {
        let result = decode_payload(&[0xC3, 0x28], ResourceKind::Stringsdict);
        assert!(matches!(result, Err(Error::Decoding { .. })));
        let odd = decode_payload(&[0x41], ResourceKind::Strings);
        assert!(odd.is_err());
    }
}
