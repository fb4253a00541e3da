//! Canonical names block: one `[u8 unit_count][u16 LE units]` record per entry.

use minipack_common::text::utf16_to_utf8;
use minipack_common::BinaryReader;

use crate::format::MAX_NAME_LEN;
use crate::{CorruptReason, Error, Result};

/// Append one canonical name record.
pub(crate) fn write_utf16_name(out: &mut Vec<u8>, name: &str, units: &[u16]) -> Result<()> {
    if units.len() > MAX_NAME_LEN {
        return Err(Error::NameTooLong {
            name: name.to_string(),
            len: units.len(),
            max: MAX_NAME_LEN,
        });
    }

    out.push(units.len() as u8);
    for unit in units {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    Ok(())
}

/// Read `count` canonical name records.
pub(crate) fn read_utf16_names(
    reader: &mut BinaryReader<'_>,
    count: usize,
) -> std::result::Result<Vec<String>, CorruptReason> {
    let mut names = Vec::with_capacity(count);

    for index in 0..count {
        let overrun = |_| CorruptReason::NameBlockOverrun { index };

        let len = reader.read_u8().map_err(overrun)? as usize;
        let units = reader.read_u16_units(len).map_err(overrun)?;
        let name = utf16_to_utf8(&units)
            .map_err(|source| CorruptReason::NameDecode { index, source })?;

        names.push(name);
    }

    Ok(names)
}
