//! Name and text encoding conversion.
//!
//! Entry names are stored as UTF-16 code units inside a pack, while the rest
//! of the toolchain works with UTF-8. Conversions here are strict: malformed
//! input is an error and is never replaced with substitute characters.

use crate::EncodingError;

const BOM_UTF8: &[u8] = &[0xEF, 0xBB, 0xBF];
const BOM_UTF16_LE: &[u8] = &[0xFF, 0xFE];
const BOM_UTF16_BE: &[u8] = &[0xFE, 0xFF];
const BOM_UTF32_LE: &[u8] = &[0xFF, 0xFE, 0x00, 0x00];
const BOM_UTF32_BE: &[u8] = &[0x00, 0x00, 0xFE, 0xFF];

/// Text encoding identified from a byte order mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
    Utf32Le,
    Utf32Be,
}

impl TextEncoding {
    /// Detect the encoding from a leading BOM.
    ///
    /// Returns the encoding and the BOM length, or `None` when the buffer
    /// carries no BOM.
    pub fn detect(bytes: &[u8]) -> Option<(Self, usize)> {
        // UTF-32LE must be tested before UTF-16LE, its BOM is a prefix.
        if bytes.starts_with(BOM_UTF32_LE) {
            Some((Self::Utf32Le, 4))
        } else if bytes.starts_with(BOM_UTF32_BE) {
            Some((Self::Utf32Be, 4))
        } else if bytes.starts_with(BOM_UTF8) {
            Some((Self::Utf8, 3))
        } else if bytes.starts_with(BOM_UTF16_LE) {
            Some((Self::Utf16Le, 2))
        } else if bytes.starts_with(BOM_UTF16_BE) {
            Some((Self::Utf16Be, 2))
        } else {
            None
        }
    }
}

/// Convert UTF-8 bytes to UTF-16 code units.
///
/// Rejects overlong forms, truncated sequences, stray continuation bytes,
/// encoded surrogates and code points above U+10FFFF. Supplementary plane
/// characters become surrogate pairs.
pub fn utf8_to_utf16(bytes: &[u8]) -> Result<Vec<u16>, EncodingError> {
    Ok(validate_utf8(bytes)?.encode_utf16().collect())
}

/// Validate UTF-8 bytes, borrowing them as a `str`.
pub fn validate_utf8(bytes: &[u8]) -> Result<&str, EncodingError> {
    std::str::from_utf8(bytes).map_err(|e| {
        let offset = e.valid_up_to();
        match e.error_len() {
            Some(_) => EncodingError::InvalidUtf8 { offset },
            None => EncodingError::TruncatedUtf8 { offset },
        }
    })
}

/// Convert UTF-16 code units to a UTF-8 string.
///
/// A high surrogate must be immediately followed by a low surrogate; any
/// unpaired surrogate fails the conversion.
pub fn utf16_to_utf8(units: &[u16]) -> Result<String, EncodingError> {
    let mut out = String::with_capacity(units.len());
    let mut offset = 0;

    for decoded in char::decode_utf16(units.iter().copied()) {
        match decoded {
            Ok(c) => {
                out.push(c);
                offset += c.len_utf16();
            }
            Err(e) => {
                let unit = e.unpaired_surrogate();
                return Err(if (0xD800..=0xDBFF).contains(&unit) {
                    EncodingError::UnpairedHighSurrogate { unit, offset }
                } else {
                    EncodingError::UnpairedLowSurrogate { unit, offset }
                });
            }
        }
    }

    Ok(out)
}

/// Decode a text buffer to UTF-8, honouring and stripping a leading BOM.
///
/// Buffers without a BOM are decoded as UTF-8 on every platform.
pub fn decode_text(bytes: &[u8]) -> Result<String, EncodingError> {
    let (encoding, bom_len) = TextEncoding::detect(bytes).unwrap_or((TextEncoding::Utf8, 0));
    let body = &bytes[bom_len..];

    match encoding {
        TextEncoding::Utf8 => validate_utf8(body).map(str::to_owned),
        TextEncoding::Utf16Le => utf16_to_utf8(&to_units(body, u16::from_le_bytes)?),
        TextEncoding::Utf16Be => utf16_to_utf8(&to_units(body, u16::from_be_bytes)?),
        TextEncoding::Utf32Le => decode_utf32(body, u32::from_le_bytes),
        TextEncoding::Utf32Be => decode_utf32(body, u32::from_be_bytes),
    }
}

fn to_units(body: &[u8], read: fn([u8; 2]) -> u16) -> Result<Vec<u16>, EncodingError> {
    if body.len() % 2 != 0 {
        return Err(EncodingError::OddLength {
            len: body.len(),
            unit: 2,
        });
    }
    Ok(body.chunks_exact(2).map(|p| read([p[0], p[1]])).collect())
}

fn decode_utf32(body: &[u8], read: fn([u8; 4]) -> u32) -> Result<String, EncodingError> {
    if body.len() % 4 != 0 {
        return Err(EncodingError::OddLength {
            len: body.len(),
            unit: 4,
        });
    }

    let mut out = String::with_capacity(body.len() / 4);
    for (i, quad) in body.chunks_exact(4).enumerate() {
        let value = read([quad[0], quad[1], quad[2], quad[3]]);
        let c = char::from_u32(value).ok_or(EncodingError::InvalidCodePoint {
            value,
            offset: i * 4,
        })?;
        out.push(c);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_round_trip() {
        let units = utf8_to_utf16(b"a.txt").unwrap();
        assert_eq!(units, vec![0x61, 0x2E, 0x74, 0x78, 0x74]);
        assert_eq!(utf16_to_utf8(&units).unwrap(), "a.txt");
    }

    #[test]
    fn test_multilingual_round_trip() {
        for name in ["données/été.txt", "日本語.bin", "emoji_😀.png", "𐍈", ""] {
            let units = utf8_to_utf16(name.as_bytes()).unwrap();
            assert_eq!(utf16_to_utf8(&units).unwrap(), name);
        }
    }

    #[test]
    fn test_surrogate_pair_arithmetic() {
        // U+1F600: cp - 0x10000 = 0xF600
        let units = utf8_to_utf16("😀".as_bytes()).unwrap();
        assert_eq!(units, vec![0xD800 + (0xF600 >> 10), 0xDC00 + (0xF600 & 0x3FF)]);
        assert_eq!(units, vec![0xD83D, 0xDE00]);
    }

    #[test]
    fn test_rejects_truncated_sequence() {
        // First two bytes of a three byte sequence
        assert_eq!(
            utf8_to_utf16(&[b'a', 0xE6, 0x97]),
            Err(EncodingError::TruncatedUtf8 { offset: 1 })
        );
    }

    #[test]
    fn test_rejects_overlong_nul() {
        assert_eq!(
            utf8_to_utf16(&[0xC0, 0x80]),
            Err(EncodingError::InvalidUtf8 { offset: 0 })
        );
    }

    #[test]
    fn test_rejects_encoded_surrogate_and_out_of_range() {
        // U+D800 encoded as three bytes
        assert!(utf8_to_utf16(&[0xED, 0xA0, 0x80]).is_err());
        // 0x110000
        assert!(utf8_to_utf16(&[0xF4, 0x90, 0x80, 0x80]).is_err());
        // Stray continuation byte
        assert!(utf8_to_utf16(&[b'x', 0x80]).is_err());
    }

    #[test]
    fn test_rejects_lone_surrogates() {
        assert_eq!(
            utf16_to_utf8(&[0x61, 0xD83D]),
            Err(EncodingError::UnpairedHighSurrogate {
                unit: 0xD83D,
                offset: 1
            })
        );
        assert_eq!(
            utf16_to_utf8(&[0xD83D, 0x0041]),
            Err(EncodingError::UnpairedHighSurrogate {
                unit: 0xD83D,
                offset: 0
            })
        );
        assert_eq!(
            utf16_to_utf8(&[0xDE00]),
            Err(EncodingError::UnpairedLowSurrogate {
                unit: 0xDE00,
                offset: 0
            })
        );
    }

    #[test]
    fn test_detect_bom() {
        assert_eq!(TextEncoding::detect(b"\xEF\xBB\xBFa"), Some((TextEncoding::Utf8, 3)));
        assert_eq!(TextEncoding::detect(b"\xFF\xFEa\x00"), Some((TextEncoding::Utf16Le, 2)));
        assert_eq!(TextEncoding::detect(b"\xFE\xFF\x00a"), Some((TextEncoding::Utf16Be, 2)));
        assert_eq!(
            TextEncoding::detect(b"\xFF\xFE\x00\x00a\x00\x00\x00"),
            Some((TextEncoding::Utf32Le, 4))
        );
        assert_eq!(
            TextEncoding::detect(b"\x00\x00\xFE\xFF\x00\x00\x00a"),
            Some((TextEncoding::Utf32Be, 4))
        );
        assert_eq!(TextEncoding::detect(b"plain"), None);
    }

    #[test]
    fn test_decode_text_variants() {
        assert_eq!(decode_text(b"\xEF\xBB\xBFlist").unwrap(), "list");
        assert_eq!(decode_text(b"no bom").unwrap(), "no bom");
        assert_eq!(decode_text(b"\xFF\xFEh\x00i\x00").unwrap(), "hi");
        assert_eq!(decode_text(b"\xFE\xFF\x00h\x00i").unwrap(), "hi");
        assert_eq!(decode_text(b"\xFF\xFE\x00\x00h\x00\x00\x00").unwrap(), "h");
        assert_eq!(decode_text(b"\x00\x00\xFE\xFF\x00\x01\xF6\x00").unwrap(), "😀");
    }

    #[test]
    fn test_decode_text_errors() {
        assert!(decode_text(b"\xC0\x80").is_err());
        assert_eq!(
            decode_text(b"\xFF\xFEh"),
            Err(EncodingError::OddLength { len: 1, unit: 2 })
        );
        assert_eq!(
            decode_text(b"\x00\x00\xFE\xFF\x00\x00\xD8\x00"),
            Err(EncodingError::InvalidCodePoint {
                value: 0xD800,
                offset: 0
            })
        );
    }
}
