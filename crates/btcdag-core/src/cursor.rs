//! Peekable little-endian byte cursor over an immutable buffer.

use crate::error::{DagError, Result};

/// A read position over a borrowed byte slice.
///
/// Every read names the field it is reading so truncation errors point at
/// the exact place the input ran out.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Create a cursor positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Cursor { data, pos: 0 }
    }

    /// Current byte offset from the start of the buffer.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Whether the whole buffer has been consumed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Capacity to reserve for `count` items read off the wire.
    ///
    /// No more items can follow than fit in the remaining bytes at
    /// `min_encoded_len` bytes each.
    pub fn capacity_hint(&self, count: usize, min_encoded_len: usize) -> usize {
        count.min(self.remaining() / min_encoded_len.max(1))
    }

    /// Look at the next `n` bytes without consuming them.
    ///
    /// Returns `None` if fewer than `n` bytes remain.
    pub fn peek(&self, n: usize) -> Option<&'a [u8]> {
        self.data.get(self.pos..self.pos.checked_add(n)?)
    }

    /// Consume exactly `n` bytes.
    pub fn read_bytes(&mut self, n: usize, field: &'static str) -> Result<&'a [u8]> {
        let bytes = self.peek(n).ok_or(DagError::TruncatedInput {
            field,
            offset: self.pos,
            needed: n,
            available: self.remaining(),
        })?;
        self.pos += n;
        Ok(bytes)
    }

    /// Consume a fixed-size array.
    pub fn read_array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N, field)?);
        Ok(out)
    }

    pub fn read_u8(&mut self, field: &'static str) -> Result<u8> {
        Ok(self.read_array::<1>(field)?[0])
    }

    pub fn read_u16_le(&mut self, field: &'static str) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array(field)?))
    }

    pub fn read_u32_le(&mut self, field: &'static str) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array(field)?))
    }

    pub fn read_u64_le(&mut self, field: &'static str) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_array(field)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_little_endian_reads() {
        let data = [0x01, 0x02, 0x03, 0x04, 0xEF, 0xBE, 0xAD, 0xDE];
        let mut cursor = Cursor::new(&data);

        assert_eq!(cursor.read_u32_le("a").unwrap(), 0x04030201);
        assert_eq!(cursor.read_u32_le("b").unwrap(), 0xDEADBEEF);
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_peek_does_not_consume() {
        let data = [0x00, 0x01, 0x02];
        let cursor = Cursor::new(&data);

        assert_eq!(cursor.peek(2), Some(&[0x00, 0x01][..]));
        assert_eq!(cursor.position(), 0);
        assert_eq!(cursor.peek(4), None);
    }

    #[test]
    fn test_short_read_reports_field_and_offset() {
        let data = [0u8; 6];
        let mut cursor = Cursor::new(&data);
        cursor.read_u32_le("version").unwrap();

        let err = cursor.read_u32_le("lock_time").unwrap_err();
        assert_eq!(
            err,
            DagError::TruncatedInput {
                field: "lock_time",
                offset: 4,
                needed: 4,
                available: 2,
            }
        );
        // A failed read leaves the position untouched.
        assert_eq!(cursor.position(), 4);
    }

    #[test]
    fn test_capacity_hint_bounded_by_encoded_size() {
        let data = [0u8; 125];
        let cursor = Cursor::new(&data);

        assert_eq!(cursor.capacity_hint(usize::MAX, 60), 2);
        assert_eq!(cursor.capacity_hint(1, 60), 1);
        assert_eq!(cursor.capacity_hint(usize::MAX, 1), 125);
        assert_eq!(cursor.capacity_hint(3, 0), 3);
    }

    #[test]
    fn test_read_bytes_borrows_input() {
        let data = b"hello world";
        let mut cursor = Cursor::new(data);

        assert_eq!(cursor.read_bytes(5, "word").unwrap(), b"hello");
        assert_eq!(cursor.remaining(), 6);
        assert_eq!(cursor.read_bytes(0, "empty").unwrap(), b"");
    }
}
