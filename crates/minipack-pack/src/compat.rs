//! Names blocks written by older MiniPack tools.
//!
//! Historical archives share the preamble, version field and metadata table
//! with the canonical format but store names differently. Nothing here is
//! used unless a caller selects a [`NameLayout`] other than
//! [`NameLayout::Utf16`]; the layout is never guessed from the data.
//!
//! ```no_run
//! use minipack_pack::{MiniPackReader, NameLayout};
//!
//! let reader = MiniPackReader::open_with_layout("old.pack", NameLayout::FlatUtf8)?;
//! for entry in reader.entries() {
//!     println!("{}", entry.name);
//! }
//! # Ok::<(), minipack_pack::Error>(())
//! ```

use minipack_common::text::{utf16_to_utf8, validate_utf8};
use minipack_common::BinaryReader;

use crate::format::{NameLayout, MAX_NAME_LEN};
use crate::names;
use crate::{CorruptReason, Error, Result};

const TAG_UTF8: u8 = 0;
const TAG_UTF16LE: u8 = 1;

/// Encode a names block in any layout.
pub fn encode_names<'a, I>(layout: NameLayout, names: I, out: &mut Vec<u8>) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    match layout {
        NameLayout::Utf16 => {
            for name in names {
                let units: Vec<u16> = name.encode_utf16().collect();
                names::write_utf16_name(out, name, &units)?;
            }
            Ok(())
        }
        NameLayout::FlatUtf8 => encode_flat_utf8(names, out),
        NameLayout::Tagged => {
            for name in names {
                let units: Vec<u16> = name.encode_utf16().collect();
                out.push(TAG_UTF16LE);
                names::write_utf16_name(out, name, &units)?;
            }
            Ok(())
        }
    }
}

/// Decode `count` names from a names block in any layout.
pub fn decode_names(
    layout: NameLayout,
    reader: &mut BinaryReader<'_>,
    count: usize,
) -> std::result::Result<Vec<String>, CorruptReason> {
    match layout {
        NameLayout::Utf16 => names::read_utf16_names(reader, count),
        NameLayout::FlatUtf8 => decode_flat_utf8(reader, count),
        NameLayout::Tagged => decode_tagged(reader, count),
    }
}

fn encode_flat_utf8<'a, I>(names: I, out: &mut Vec<u8>) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let names: Vec<&str> = names.into_iter().collect();

    for name in &names {
        if name.len() > MAX_NAME_LEN {
            return Err(Error::NameTooLong {
                name: name.to_string(),
                len: name.len(),
                max: MAX_NAME_LEN,
            });
        }
        if name.as_bytes().contains(&0) {
            return Err(Error::NameContainsNul(name.to_string()));
        }
        out.push(name.len() as u8);
    }

    for name in &names {
        out.extend_from_slice(name.as_bytes());
        out.push(0);
    }
    Ok(())
}

fn decode_flat_utf8(
    reader: &mut BinaryReader<'_>,
    count: usize,
) -> std::result::Result<Vec<String>, CorruptReason> {
    let lengths = reader
        .read_bytes(count)
        .map_err(|_| CorruptReason::NameBlockOverrun { index: 0 })?;

    let mut names = Vec::with_capacity(count);
    for (index, &declared) in lengths.iter().enumerate() {
        let bytes = reader
            .read_cstr_bytes()
            .map_err(|_| CorruptReason::NameBlockOverrun { index })?;

        if bytes.len() != declared as usize {
            return Err(CorruptReason::NameLengthMismatch {
                index,
                declared: declared as usize,
                actual: bytes.len(),
            });
        }

        let name = validate_utf8(bytes)
            .map_err(|source| CorruptReason::NameDecode { index, source })?;
        names.push(name.to_string());
    }

    Ok(names)
}

fn decode_tagged(
    reader: &mut BinaryReader<'_>,
    count: usize,
) -> std::result::Result<Vec<String>, CorruptReason> {
    let mut names = Vec::with_capacity(count);

    for index in 0..count {
        let overrun = |_| CorruptReason::NameBlockOverrun { index };

        let tag = reader.read_u8().map_err(overrun)?;
        let len = reader.read_u8().map_err(overrun)? as usize;

        let name = match tag {
            TAG_UTF8 => {
                let bytes = reader.read_bytes(len).map_err(overrun)?;
                validate_utf8(bytes)
                    .map(str::to_string)
                    .map_err(|source| CorruptReason::NameDecode { index, source })?
            }
            TAG_UTF16LE => {
                let units = reader.read_u16_units(len).map_err(overrun)?;
                utf16_to_utf8(&units)
                    .map_err(|source| CorruptReason::NameDecode { index, source })?
            }
            tag => return Err(CorruptReason::UnknownNameTag { index, tag }),
        };

        names.push(name);
    }

    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_utf8_block() {
        let mut out: Vec<u8> = Vec::new();
        encode_names(NameLayout::FlatUtf8, ["a.txt", "é"], &mut out).unwrap();
        assert_eq!(out, b"\x05\x02a.txt\0\xC3\xA9\0".to_vec());

        let mut reader = BinaryReader::new(&out);
        let names = decode_names(NameLayout::FlatUtf8, &mut reader, 2).unwrap();
        assert_eq!(names, vec!["a.txt", "é"]);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_flat_utf8_rejects_nul() {
        let mut out: Vec<u8> = Vec::new();
        let err = encode_names(NameLayout::FlatUtf8, ["a\0b"], &mut out).unwrap_err();
        assert!(matches!(err, Error::NameContainsNul(_)));
    }

    #[test]
    fn test_flat_utf8_length_mismatch() {
        let block = b"\x03abcd\0";
        let mut reader = BinaryReader::new(block);
        assert_eq!(
            decode_names(NameLayout::FlatUtf8, &mut reader, 1),
            Err(CorruptReason::NameLengthMismatch {
                index: 0,
                declared: 3,
                actual: 4
            })
        );
    }

    #[test]
    fn test_flat_utf8_missing_terminator() {
        let block = b"\x01\x01a\0b";
        let mut reader = BinaryReader::new(block);
        assert_eq!(
            decode_names(NameLayout::FlatUtf8, &mut reader, 2),
            Err(CorruptReason::NameBlockOverrun { index: 1 })
        );
    }

    #[test]
    fn test_flat_utf8_rejects_invalid_bytes() {
        let block = b"\x02\xC0\x80\0";
        let mut reader = BinaryReader::new(block);
        assert!(matches!(
            decode_names(NameLayout::FlatUtf8, &mut reader, 1),
            Err(CorruptReason::NameDecode { index: 0, .. })
        ));
    }

    #[test]
    fn test_tagged_block() {
        let mut out: Vec<u8> = Vec::new();
        encode_names(NameLayout::Tagged, ["ab"], &mut out).unwrap();
        assert_eq!(out, vec![1, 2, b'a', 0, b'b', 0]);

        // Mix in a UTF-8 tagged record as older writers produced
        out.extend_from_slice(&[0, 3, b'x', b'y', b'z']);

        let mut reader = BinaryReader::new(&out);
        let names = decode_names(NameLayout::Tagged, &mut reader, 2).unwrap();
        assert_eq!(names, vec!["ab", "xyz"]);
    }

    #[test]
    fn test_tagged_unknown_tag() {
        let block = [7, 1, b'a'];
        let mut reader = BinaryReader::new(&block);
        assert_eq!(
            decode_names(NameLayout::Tagged, &mut reader, 1),
            Err(CorruptReason::UnknownNameTag { index: 0, tag: 7 })
        );
    }

    #[test]
    fn test_utf16_layout_delegates_to_canonical() {
        let mut out: Vec<u8> = Vec::new();
        encode_names(NameLayout::Utf16, ["ab"], &mut out).unwrap();
        assert_eq!(out, vec![2, b'a', 0, b'b', 0]);

        let mut reader = BinaryReader::new(&out);
        assert_eq!(
            decode_names(NameLayout::Utf16, &mut reader, 1).unwrap(),
            vec!["ab"]
        );
    }
}
