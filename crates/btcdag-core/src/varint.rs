//! Bitcoin compact-size integers.
//!
//! A tag byte below `0xfd` is the value itself; `0xfd`, `0xfe` and `0xff`
//! are followed by a little-endian u16, u32 and u64 respectively.

use alloc::vec::Vec;

use crate::cursor::Cursor;
use crate::error::{DagError, Result};

/// Read a compact-size integer.
///
/// Non-minimal encodings (e.g. `0xfd 0x01 0x00`) are accepted.
pub fn read_varint(cursor: &mut Cursor<'_>, field: &'static str) -> Result<u64> {
    match cursor.read_u8(field)? {
        0xfd => Ok(cursor.read_u16_le(field)? as u64),
        0xfe => Ok(cursor.read_u32_le(field)? as u64),
        0xff => cursor.read_u64_le(field),
        n => Ok(n as u64),
    }
}

/// Read a compact-size integer used as a count or length.
///
/// Fails with [`DagError::MalformedCount`] if the value exceeds
/// `isize::MAX`, the largest size any allocation can have.
pub fn read_count(cursor: &mut Cursor<'_>, field: &'static str) -> Result<usize> {
    let offset = cursor.position();
    let value = read_varint(cursor, field)?;
    if value > isize::MAX as u64 {
        return Err(DagError::MalformedCount {
            field,
            offset,
            value,
        });
    }
    Ok(value as usize)
}

/// Read a compact-size length followed by that many bytes.
pub fn read_var_bytes<'a>(cursor: &mut Cursor<'a>, field: &'static str) -> Result<&'a [u8]> {
    let len = read_count(cursor, field)?;
    cursor.read_bytes(len, field)
}

/// Encode a compact-size integer using the shortest form.
pub fn write_varint(value: u64, output: &mut Vec<u8>) {
    if value < 0xfd {
        output.push(value as u8);
    } else if value <= 0xffff {
        output.push(0xfd);
        output.extend_from_slice(&(value as u16).to_le_bytes());
    } else if value <= 0xffff_ffff {
        output.push(0xfe);
        output.extend_from_slice(&(value as u32).to_le_bytes());
    } else {
        output.push(0xff);
        output.extend_from_slice(&value.to_le_bytes());
    }
}

/// Encode a length-prefixed byte string.
pub fn write_var_bytes(bytes: &[u8], output: &mut Vec<u8>) {
    write_varint(bytes.len() as u64, output);
    output.extend_from_slice(bytes);
}
